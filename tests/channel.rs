use std::collections::VecDeque;

use libdweet::channel::{ChannelError, ConfigBinding, DweetChannel, DweetEngine};
use libdweet::dispatch::PollInterval;
use libdweet::dweet::config::{SettingsRegion, read_stored_checksum, region_checksum};
use libdweet::dweet::{
    DweetCommand, DweetError, Setting, SettingValue, parse_hex_u32, write_hex_u32,
};
use libdweet::sentence;
use libdweet::storage::RamStorage;
use libdweet::timer::{TimerHandle, TimerList};
use libdweet::transport::{Read, Transport, Write, error::Error};

struct MockTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    read_chunk: usize,
}

impl MockTransport {
    fn new(incoming: &[u8]) -> Self {
        Self {
            rx: incoming.iter().copied().collect(),
            tx: Vec::new(),
            read_chunk: usize::MAX,
        }
    }
}

impl Read for MockTransport {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len()).min(self.read_chunk);
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockTransport {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for MockTransport {}

struct Device {
    timers: TimerList<Device, 4>,
    blink: Option<TimerHandle>,
    blink_interval_ms: u32,
    blinks: u32,
    store: RamStorage<64>,
    pings: u32,
}

impl Device {
    fn new() -> Self {
        Self {
            timers: TimerList::new(),
            blink: None,
            blink_interval_ms: 1_000,
            blinks: 0,
            store: RamStorage::new(),
            pings: 0,
        }
    }
}

fn blink_timer(device: &mut Device, _now: u32) -> PollInterval {
    device.blinks += 1;
    PollInterval::Idle
}

// Setting a new interval retimes the running blink timer in place, so the
// change takes effect without waiting out the old period.
fn blink_interval(
    device: &mut Device,
    value: &mut SettingValue,
    is_set: bool,
) -> Result<(), DweetError> {
    if is_set {
        let interval = parse_hex_u32(value)?;
        if interval == 0 {
            return Err(DweetError::InvalidParameter);
        }
        device.blink_interval_ms = interval;
        if let Some(handle) = device.blink {
            device.timers.reschedule(handle, interval);
        }
        Ok(())
    } else {
        value.clear();
        write_hex_u32(device.blink_interval_ms, value)
    }
}

const STATE: &[Setting<Device>] = &[Setting {
    name: "BLINKINTERVAL",
    offset: 0,
    size: 8,
    handler: blink_interval,
}];

const REGION: SettingsRegion = SettingsRegion { base: 0, len: 8 };

fn ping(device: &mut Device, command: &DweetCommand<'_>) -> Option<Result<SettingValue, DweetError>> {
    if command.op != "PING" {
        return None;
    }
    device.pings += 1;
    let mut value = SettingValue::new();
    value.push_str("PONG").ok()?;
    Some(Ok(value))
}

fn engine() -> DweetEngine<'static, Device, RamStorage<64>> {
    DweetEngine {
        prefix: "PDWT",
        state: STATE,
        config: Some(ConfigBinding {
            table: STATE,
            region: REGION,
            storage: |device: &mut Device| &mut device.store,
        }),
        unhandled: Some(ping),
    }
}

fn frame(body: &str) -> Vec<u8> {
    let mut out: heapless::String<85> = heapless::String::new();
    sentence::encode(body, &mut out).unwrap();
    out.as_bytes().to_vec()
}

#[test]
fn setstate_retimes_the_running_timer_and_replies() {
    let mut device = Device::new();
    device.blink = Some(device.timers.register(0, 1_000, blink_timer).unwrap());

    let mut channel = DweetChannel::new(MockTransport::new(
        b"$PDWT,SETSTATE=BLINKINTERVAL:00007530*75\n",
    ));
    let result = channel.poll(&mut device, &engine());

    assert_eq!(result, PollInterval::RunAgain);
    assert_eq!(device.blink_interval_ms, 0x7530);
    assert_eq!(
        device.timers.interval_ms(device.blink.unwrap()),
        Some(0x7530),
        "the live registration must pick up the new period"
    );
    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,SETSTATE_REPLY=BLINKINTERVAL")
    );
}

#[test]
fn getstate_echoes_the_canonical_encoding() {
    let mut device = Device::new();
    device.blink_interval_ms = 0x7530;

    let mut channel = DweetChannel::new(MockTransport::new(b"$PDWT,GETSTATE=BLINKINTERVAL*5A\n"));
    channel.poll(&mut device, &engine());

    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,GETSTATE_REPLY=BLINKINTERVAL:00007530")
    );
}

#[test]
fn every_item_in_a_sentence_gets_its_own_reply() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(
        b"$PDWT,GETSTATE=BLINKINTERVAL,GETSTATE=NOSUCH\n",
    ));
    channel.poll(&mut device, &engine());

    let mut expected = frame("PDWT,GETSTATE_REPLY=BLINKINTERVAL:000003E8");
    expected.extend(frame("PDWT,GETSTATE_ERROR=NOSUCH:UNSUP"));
    assert_eq!(channel.transport_mut().tx, expected);
}

#[test]
fn one_byte_reads_assemble_the_same_sentence() {
    let mut device = Device::new();
    device.blink_interval_ms = 0x7530;

    let mut transport = MockTransport::new(b"$PDWT,GETSTATE=BLINKINTERVAL*5A\n");
    transport.read_chunk = 1;
    let mut channel = DweetChannel::new(transport);
    channel.poll(&mut device, &engine());

    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,GETSTATE_REPLY=BLINKINTERVAL:00007530")
    );
}

#[test]
fn unknown_verbs_fall_to_the_hook_then_to_unsup() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(b"$PDWT,PING=NOW,FROB=X\n"));
    channel.poll(&mut device, &engine());

    assert_eq!(device.pings, 1);
    let mut expected = frame("PDWT,PING_REPLY=NOW:PONG");
    expected.extend(frame("PDWT,FROB_ERROR=X:UNSUP"));
    assert_eq!(channel.transport_mut().tx, expected);
}

#[test]
fn setstate_without_a_value_is_an_argument_error() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(b"$PDWT,SETSTATE=BLINKINTERVAL\n"));
    channel.poll(&mut device, &engine());

    assert_eq!(device.blink_interval_ms, 1_000);
    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,SETSTATE_ERROR=BLINKINTERVAL:INVALID_PARAMETER")
    );
}

#[test]
fn corrupted_checksums_are_dropped_without_a_reply() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(
        b"$PDWT,SETSTATE=BLINKINTERVAL:00007530*76\n",
    ));
    channel.poll(&mut device, &engine());

    assert_eq!(device.blink_interval_ms, 1_000, "corrupt command must not apply");
    assert!(channel.transport_mut().tx.is_empty());
}

#[test]
fn foreign_talkers_are_ignored() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(
        b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,\n",
    ));
    let result = channel.poll(&mut device, &engine());

    assert_eq!(result, PollInterval::RunAgain); // consumed, just not answered
    assert!(channel.transport_mut().tx.is_empty());
}

#[test]
fn line_noise_then_sync_then_command_recovers() {
    let mut wire = b"\x00\x7f garbage without framing".to_vec();
    wire.push(b'\n'); // peer-issued sync
    wire.extend(b"$PDWT,GETSTATE=BLINKINTERVAL*5A\n");

    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(&wire));
    channel.poll(&mut device, &engine());

    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,GETSTATE_REPLY=BLINKINTERVAL:000003E8")
    );
}

#[test]
fn setconfig_persists_getconfig_reads_back() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(
        b"$PDWT,SETCONFIG=BLINKINTERVAL:00007530*28\n",
    ));
    channel.poll(&mut device, &engine());

    assert_eq!(&device.store.as_slice()[..8], b"00007530");
    let stored = read_stored_checksum(&mut device.store, &REGION).unwrap();
    let computed = region_checksum(&mut device.store, &REGION).unwrap();
    assert_eq!(stored, computed);
    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,SETCONFIG_REPLY=BLINKINTERVAL")
    );

    // The runtime value is untouched; the persisted one reads back.
    assert_eq!(device.blink_interval_ms, 1_000);
    channel.transport_mut().tx.clear();
    channel
        .transport_mut()
        .rx
        .extend(b"$PDWT,GETCONFIG=BLINKINTERVAL*07\n");
    channel.poll(&mut device, &engine());
    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,GETCONFIG_REPLY=BLINKINTERVAL:00007530")
    );
}

#[test]
fn setconfig_rejects_bad_hex_without_writing() {
    let mut device = Device::new();
    let before = device.store.as_slice().to_vec();

    let mut channel = DweetChannel::new(MockTransport::new(
        b"$PDWT,SETCONFIG=BLINKINTERVAL:0000753G\n",
    ));
    channel.poll(&mut device, &engine());

    assert_eq!(device.store.as_slice(), &before[..]);
    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,SETCONFIG_ERROR=BLINKINTERVAL:INVALID_PARAMETER")
    );
}

#[test]
fn config_ops_without_a_binding_are_unsupported() {
    let mut device = Device::new();
    let engine: DweetEngine<'_, Device> = DweetEngine::new(STATE);

    let mut channel = DweetChannel::new(MockTransport::new(b"$PDWT,GETCONFIG=BLINKINTERVAL*07\n"));
    channel.poll(&mut device, &engine);

    assert_eq!(
        channel.transport_mut().tx,
        frame("PDWT,GETCONFIG_ERROR=BLINKINTERVAL:UNSUP")
    );
}

#[test]
fn idle_transport_polls_idle() {
    let mut device = Device::new();
    let mut channel = DweetChannel::new(MockTransport::new(b""));
    assert_eq!(channel.poll(&mut device, &engine()), PollInterval::Idle);
}

#[test]
fn send_sentence_frames_and_send_sync_is_a_bare_terminator() {
    let mut channel = DweetChannel::new(MockTransport::new(b""));
    channel.send_sentence("PDWT,GETSTATE=BLINKINTERVAL").unwrap();
    channel.send_sync().unwrap();

    let mut expected = frame("PDWT,GETSTATE=BLINKINTERVAL");
    expected.push(b'\n');
    assert_eq!(channel.transport_mut().tx, expected);

    let long = "X".repeat(100);
    assert_eq!(channel.send_sentence(&long), Err(ChannelError::TooLong));
}
