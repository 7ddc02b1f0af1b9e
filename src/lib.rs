//! CIR capture firmware for the DW1000 UWB transceiver
//!
//! A pair of small firmware programs for a Raspberry Pi with a DW1000
//! attached to its SPI bus: a fixed-rate beacon sender, and a receiver that
//! captures the channel impulse response (CIR) the device accumulates for
//! every beacon it accepts and writes it to disk, one timestamped file per
//! frame.
//!
//! The receive pipeline is [`capture::CaptureSession`]: a polled
//! [`receiver::Receiver`] validates and deduplicates incoming beacon
//! frames, [`cir::read_cir`] assembles the accumulator waveform from
//! chunked device-memory reads, and [`sink::save`] persists the complex
//! taps. All device I/O goes through the [`device::DeviceAccess`] trait;
//! [`platform::Dw1000`] implements it for the Pi.

#![deny(missing_docs)]

pub mod beacon;
pub mod capture;
pub mod cir;
pub mod configs;
pub mod device;
pub mod frame;
pub mod platform;
pub mod receiver;
pub mod sink;

pub use capture::CaptureSession;
pub use cir::CirTap;
pub use configs::RadioConfig;
pub use device::DeviceAccess;
pub use receiver::ValidatedFrame;
