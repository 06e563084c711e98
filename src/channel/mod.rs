//! Dweet channels: one pollable protocol endpoint per transport.
//!
//! A [`DweetChannel`] owns a byte transport and a sentence assembler; a
//! [`DweetEngine`] describes what the device speaks: the sentence prefix,
//! the runtime settings table, the optional persisted-settings binding, and
//! the single application-level hook for commands nothing else handled. One
//! engine can be shared by several channels (serial and radio-serial, say),
//! each channel being its own endpoint.
//!
//! # Wiring pattern
//!
//! Channels live *next to* the device state they configure, not inside it,
//! so a poll function can split-borrow the two:
//!
//! ```rust,no_run
//! use libdweet::channel::{DweetChannel, DweetEngine};
//! use libdweet::dispatch::PollInterval;
//! use libdweet::dweet::Setting;
//! # use libdweet::transport::{Read, Transport, Write};
//! # struct Uart;
//! # impl Transport for Uart {}
//! # impl Read for Uart {
//! #     type Error = libdweet::transport::error::Error;
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for Uart {
//! #     type Error = libdweet::transport::error::Error;
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//!
//! struct Device {
//!     blink_interval_ms: u32,
//! }
//!
//! struct World {
//!     channel: DweetChannel<Uart>,
//!     device: Device,
//! }
//!
//! const STATE: &[Setting<Device>] = &[/* ... */];
//!
//! fn poll_channel(world: &mut World, _now: u32) -> PollInterval {
//!     let World { channel, device } = world;
//!     channel.poll(device, &DweetEngine::new(STATE))
//! }
//! ```
//!
//! Handlers reach timers, event lists, and storage through the device
//! context; replies travel back through the channel's own transport. Framing
//! errors (corrupt checksums, overflow, garbage between sentences) are
//! recovered silently by resynchronization and never surfaced to the
//! application.

use crate::dispatch::PollInterval;
use crate::dweet::config::{self, SettingsRegion};
use crate::dweet::{self, DweetCommand, DweetError, DweetOp, Setting, SettingValue};
use crate::sentence::{self, MAX_SENTENCE_LENGTH, Push, SentenceAssembler};
use crate::storage::{NoStore, Storage};
use crate::transport::Transport;

/// Default sentence prefix for Dweet traffic.
pub const DEFAULT_PREFIX: &str = "PDWT";

/// Channel send errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The sentence does not fit the frame buffer.
    TooLong,
    /// The transport rejected the write.
    Transport,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ChannelError::TooLong => defmt::write!(f, "TooLong"),
            ChannelError::Transport => defmt::write!(f, "Transport"),
        }
    }
}

/// The application hook for commands no table handled. Exactly one per
/// engine; return `None` to decline, after which the channel replies
/// `UNSUP`.
pub type UnhandledFn<A> = fn(&mut A, &DweetCommand<'_>) -> Option<Result<SettingValue, DweetError>>;

/// Binds a settings table to its persisted-storage region. The storage
/// device is reached through an accessor into the application context so
/// handlers and the config walk share one device.
pub struct ConfigBinding<'t, A, S> {
    /// The persisted settings table.
    pub table: &'t [Setting<A>],
    /// The checksummed storage range backing the table.
    pub region: SettingsRegion,
    /// Accessor for the storage device inside the application context.
    pub storage: fn(&mut A) -> &mut S,
}

impl<A, S> core::fmt::Debug for ConfigBinding<'_, A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigBinding")
            .field("entries", &self.table.len())
            .field("region", &self.region)
            .finish()
    }
}

/// Everything a channel needs to interpret traffic: prefix, tables, and the
/// unhandled-command hook.
pub struct DweetEngine<'t, A, S = NoStore> {
    /// Sentence prefix this engine answers to (default [`DEFAULT_PREFIX`]).
    pub prefix: &'static str,
    /// Runtime settings table for `GETSTATE`/`SETSTATE`.
    pub state: &'t [Setting<A>],
    /// Persisted settings binding for `GETCONFIG`/`SETCONFIG`, if any.
    pub config: Option<ConfigBinding<'t, A, S>>,
    /// Hook for commands no table handled.
    pub unhandled: Option<UnhandledFn<A>>,
}

impl<'t, A> DweetEngine<'t, A, NoStore> {
    /// An engine with the default prefix, the given runtime table, no
    /// persisted settings, and no unhandled-command hook.
    pub fn new(state: &'t [Setting<A>]) -> Self {
        Self {
            prefix: DEFAULT_PREFIX,
            state,
            config: None,
            unhandled: None,
        }
    }
}

impl<A, S> core::fmt::Debug for DweetEngine<'_, A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DweetEngine")
            .field("prefix", &self.prefix)
            .field("state_entries", &self.state.len())
            .field("config", &self.config.is_some())
            .field("unhandled", &self.unhandled.is_some())
            .finish()
    }
}

/// One Dweet protocol endpoint: a byte transport plus a sentence assembler.
pub struct DweetChannel<T> {
    transport: T,
    assembler: SentenceAssembler,
}

impl<T: Transport> DweetChannel<T> {
    /// Create a channel over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            assembler: SentenceAssembler::new(),
        }
    }

    /// Access the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the channel, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Drain pending transport bytes through the assembler, dispatching and
    /// answering every completed sentence.
    ///
    /// Never blocks. Returns [`PollInterval::RunAgain`] when at least one
    /// sentence was processed (handlers may have changed state other
    /// components react to on their next poll) and
    /// [`PollInterval::Idle`] otherwise.
    pub fn poll<A, S: Storage>(&mut self, app: &mut A, engine: &DweetEngine<'_, A, S>) -> PollInterval {
        let mut activity = false;
        let mut chunk = [0u8; 16];
        'drain: loop {
            let n = match self.transport.read(&mut chunk) {
                Ok(0) => break 'drain,
                Ok(n) => n,
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("channel transport read failed");
                    break 'drain;
                }
            };
            for &byte in &chunk[..n] {
                match self.assembler.push(byte) {
                    Push::Complete => {
                        let mut line: heapless::String<MAX_SENTENCE_LENGTH> =
                            heapless::String::new();
                        let _ = line.push_str(self.assembler.line());
                        self.assembler.reset();
                        self.process_sentence(app, engine, &line);
                        activity = true;
                    }
                    Push::Overflow => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("sentence overflow, resynchronizing");
                    }
                    Push::Synced | Push::Pending => {}
                }
            }
        }
        if activity {
            PollInterval::RunAgain
        } else {
            PollInterval::Idle
        }
    }

    fn process_sentence<A, S: Storage>(
        &mut self,
        app: &mut A,
        engine: &DweetEngine<'_, A, S>,
        line: &str,
    ) {
        let body = match sentence::validate(line) {
            Ok(body) => body,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("dropping invalid sentence");
                return;
            }
        };
        let Some((prefix, items)) = body.split_once(',') else {
            return; // not command traffic
        };
        if prefix != engine.prefix {
            return; // some other talker; not ours to answer
        }
        for item in items.split(',') {
            if item.is_empty() {
                continue;
            }
            let Some(command) = dweet::parse_command(item) else {
                #[cfg(feature = "defmt")]
                defmt::warn!("dropping malformed command item");
                continue;
            };
            let outcome = dispatch_command(app, engine, &command)
                .or_else(|| engine.unhandled.and_then(|hook| hook(app, &command)))
                .unwrap_or(Err(DweetError::Unsupported));
            self.send_reply(engine.prefix, &command, &outcome);
        }
    }

    fn send_reply(
        &mut self,
        prefix: &str,
        command: &DweetCommand<'_>,
        outcome: &Result<SettingValue, DweetError>,
    ) {
        let mut body: heapless::String<MAX_SENTENCE_LENGTH> = heapless::String::new();
        let formatted = (|| -> Result<(), ()> {
            body.push_str(prefix)?;
            body.push(',')?;
            body.push_str(command.op)?;
            match outcome {
                Ok(value) => {
                    body.push_str("_REPLY=")?;
                    body.push_str(command.name)?;
                    if !value.is_empty() {
                        body.push(':')?;
                        body.push_str(value)?;
                    }
                }
                Err(error) => {
                    body.push_str("_ERROR=")?;
                    body.push_str(command.name)?;
                    body.push(':')?;
                    body.push_str(error.token())?;
                }
            }
            Ok(())
        })();
        if formatted.is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("reply too long, dropped");
            return;
        }
        if let Err(_e) = self.send_sentence(&body) {
            #[cfg(feature = "defmt")]
            defmt::warn!("reply transmit failed");
        }
    }

    /// Frame and transmit an application-originated sentence body (prefix
    /// and fields, no `$`/checksum/terminator).
    pub fn send_sentence(&mut self, body: &str) -> Result<(), ChannelError> {
        let mut frame: heapless::String<{ MAX_SENTENCE_LENGTH + 5 }> = heapless::String::new();
        sentence::encode(body, &mut frame).map_err(|_| ChannelError::TooLong)?;
        self.write_all(frame.as_bytes())
    }

    /// Transmit a bare terminator, resynchronizing the peer's framer without
    /// issuing a command.
    pub fn send_sync(&mut self) -> Result<(), ChannelError> {
        self.write_all(&[sentence::TERMINATOR])
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), ChannelError> {
        while !bytes.is_empty() {
            match self.transport.write(bytes) {
                Ok(0) => return Err(ChannelError::Transport),
                Ok(n) => bytes = &bytes[n..],
                Err(_e) => return Err(ChannelError::Transport),
            }
        }
        self.transport.flush().map_err(|_| ChannelError::Transport)
    }
}

impl<T> core::fmt::Debug for DweetChannel<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DweetChannel")
            .field("assembler", &self.assembler)
            .finish()
    }
}

fn dispatch_command<A, S: Storage>(
    app: &mut A,
    engine: &DweetEngine<'_, A, S>,
    command: &DweetCommand<'_>,
) -> Option<Result<SettingValue, DweetError>> {
    match DweetOp::parse(command.op) {
        Some(DweetOp::GetState) => dweet::process_item(app, engine.state, command.name, None),
        Some(DweetOp::SetState) => match command.value {
            Some(_) => dweet::process_item(app, engine.state, command.name, command.value),
            // SET without a value on a known property is an argument error,
            // not an unknown command.
            None => dweet::find(engine.state, command.name)
                .map(|_| Err(DweetError::InvalidParameter)),
        },
        Some(op @ (DweetOp::GetConfig | DweetOp::SetConfig)) => {
            let binding = engine.config.as_ref()?;
            let value = match (op, command.value) {
                (DweetOp::SetConfig, Some(value)) => Some(value),
                (DweetOp::SetConfig, None) => {
                    return dweet::find(binding.table, command.name)
                        .map(|_| Err(DweetError::InvalidParameter));
                }
                _ => None,
            };
            let storage = (binding.storage)(app);
            config::process_item(storage, binding.table, &binding.region, command.name, value)
        }
        None => None,
    }
}
