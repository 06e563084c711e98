//! # libdweet - Cooperative firmware dispatch and the Dweet protocol
//!
//! A `no_std` toolkit for event-driven firmware on small microcontrollers:
//! a cooperative poll scheduler with event lists and software timers, plus
//! "Dweet", a checksummed NMEA-0183-style sentence protocol for configuring
//! and controlling a device over any serial-shaped link.
//!
//! ## Features
//!
//! ### Cooperative dispatch
//! - **Scheduler**: polls registered components and folds their requested
//!   sleep intervals into one value for the platform idle hook
//! - **Event lists**: synchronous multi-listener callback dispatch
//! - **Software timers**: one-shot and periodic callbacks over a single
//!   millisecond tick, wraparound-safe
//!
//! ### Dweet protocol
//! - Sentence framing with XOR checksums and silent resynchronization
//! - `GETSTATE`/`SETSTATE` runtime properties via settings tables
//! - `GETCONFIG`/`SETCONFIG` persisted properties with a checksummed
//!   storage region and boot-time bulk load
//!
//! Everything is statically allocated (`heapless`), single-context, and
//! callback-driven: callbacks are plain `fn` pointers taking an
//! application context, so the whole system works without `alloc` or an
//! RTOS.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libdweet = "0.1.0"
//! ```
//!
//! ### Blinky with a timer
//!
//! ```rust
//! use libdweet::dispatch::PollInterval;
//! use libdweet::timer::TimerList;
//!
//! struct Device {
//!     timers: TimerList<Device, 4>,
//!     led_on: bool,
//! }
//!
//! fn toggle_led(device: &mut Device, _now: u32) -> PollInterval {
//!     device.led_on = !device.led_on;
//!     PollInterval::Idle
//! }
//!
//! let mut device = Device { timers: TimerList::new(), led_on: false };
//! device.timers.register(0, 500, toggle_led).unwrap();
//!
//! // The platform main loop calls this from its scheduler poll function.
//! let wait = TimerList::poll(&mut device, |d| &mut d.timers, 500);
//! assert!(device.led_on);
//! assert_eq!(wait, PollInterval::SleepFor(500));
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - 8-bit and 32-bit microcontrollers without an operating system
//! - Host builds for simulation and testing
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Cooperative scheduler: pollable registration, poll intervals, and the
/// single-pass dispatch loop driven by the platform main loop.
pub mod dispatch;

/// Synchronous event lists: register callbacks against an event source and
/// dispatch to all of them.
pub mod event;

/// Software timers multiplexed over one millisecond clock.
pub mod timer;

/// Checksummed sentence framing, modeled on NMEA 0183.
pub mod sentence;

/// The Dweet name/value command protocol and its persisted-settings layer.
pub mod dweet;

/// Dweet channels binding a transport, a sentence assembler, and the
/// protocol engine into one pollable endpoint.
pub mod channel;

/// Byte-transport abstraction for serial and radio-emulated-serial links.
pub mod transport;

/// Persistent-storage abstraction backing the configuration layer.
pub mod storage;
