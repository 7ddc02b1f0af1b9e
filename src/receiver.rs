//! Frame reception and validation
//!
//! The receiver drives one polled receive cycle at a time: arm the receiver,
//! spin on the status register until the device reports a good frame or an
//! RX error, then validate and deduplicate what arrived. RX errors are
//! recovered locally by clearing the event mask and resetting the receiver;
//! they are never surfaced to the caller. Only transport failures on the
//! device access layer propagate.

use chrono::{DateTime, Local};
use log::{debug, info, trace};

use crate::device::{regs, DeviceAccess, RxMode};
use crate::frame;

/// Maximum frame length in standard PHY header mode
pub const FRAME_LEN_MAX: usize = 127;

/// A frame that carried the beacon marker and a novel sequence number
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidatedFrame {
    /// The sequence number the frame carried
    pub seq: u64,
    /// Local time at which the frame was accepted
    pub received_at: DateTime<Local>,
}

/// What a single status poll observed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RxEvent {
    /// A frame was received with a good CRC
    FrameGood,
    /// One or more RX error or timeout events fired
    Error(u32),
}

/// The polling frame receiver
///
/// Owns the reusable frame buffer and the sequence watermark. The watermark
/// starts at zero and only ever moves up, so the first accepted beacon must
/// carry a sequence number of at least 1.
pub struct Receiver {
    buffer: [u8; FRAME_LEN_MAX],
    watermark: u64,
}

impl Receiver {
    /// Creates a receiver with a cleared buffer and a zero watermark
    pub fn new() -> Self {
        Receiver {
            buffer: [0; FRAME_LEN_MAX],
            watermark: 0,
        }
    }

    /// The highest sequence number accepted so far
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Checks the status register once
    ///
    /// Returns `WouldBlock` while neither a good frame nor an error has been
    /// reported, so a cycle can spin on this without any implicit delay.
    fn poll<D: DeviceAccess>(&mut self, device: &mut D) -> nb::Result<RxEvent, D::Error> {
        let status = device.read_status().map_err(nb::Error::Other)?;

        if status & regs::SYS_STATUS_RXFCG != 0 {
            return Ok(RxEvent::FrameGood);
        }

        let errors = status & (regs::SYS_STATUS_ALL_RX_ERR | regs::SYS_STATUS_ALL_RX_TO);
        if errors != 0 {
            return Ok(RxEvent::Error(errors));
        }

        Err(nb::Error::WouldBlock)
    }

    /// Runs one receive cycle
    ///
    /// Blocks until the device reports an RX outcome. Returns
    /// `Ok(Some(frame))` when a beacon with a novel sequence number was
    /// accepted and `Ok(None)` for every locally-handled outcome: RX errors,
    /// frames from other protocols, oversized frames and stale or duplicate
    /// sequence numbers.
    pub fn receive_cycle<D: DeviceAccess>(
        &mut self,
        device: &mut D,
    ) -> Result<Option<ValidatedFrame>, D::Error> {
        // Clear leftovers from the previous reception so a skipped copy can
        // never validate against stale bytes.
        self.buffer = [0; FRAME_LEN_MAX];

        device.enable_receive(RxMode::Immediate)?;

        let event = loop {
            match self.poll(device) {
                Ok(event) => break event,
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(error)) => return Err(error),
            }
        };

        match event {
            RxEvent::FrameGood => {
                device.write_status(regs::SYS_STATUS_RXFCG)?;

                let finfo = device.read_register(regs::RX_FINFO)?;
                let len = (finfo & regs::RX_FINFO_RXFL_MASK_1023) as usize;

                if len <= FRAME_LEN_MAX {
                    device.read_frame(&mut self.buffer[..len], 0)?;
                } else {
                    // Leave the buffer cleared; the frame can't be ours.
                    debug!("dropping frame of {} bytes, buffer holds {}", len, FRAME_LEN_MAX);
                }

                Ok(self.validate())
            }
            RxEvent::Error(errors) => {
                trace!("rx error events {:#010x}, resetting receiver", errors);
                device
                    .write_status(regs::SYS_STATUS_ALL_RX_ERR | regs::SYS_STATUS_ALL_RX_TO)?;
                device.reset_receiver()?;
                Ok(None)
            }
        }
    }

    /// Applies the flag and sequence checks to the frame buffer
    fn validate(&mut self) -> Option<ValidatedFrame> {
        if !frame::is_beacon(&self.buffer) {
            // Not every frame on the channel belongs to this protocol.
            trace!("frame without beacon marker, dropping");
            return None;
        }

        // The buffer is longer than the sequence field in all cases, so the
        // parse can't come up short.
        let seq = frame::sequence_number(&self.buffer)?;

        if seq <= self.watermark {
            debug!("stale sequence number {} (watermark {})", seq, self.watermark);
            return None;
        }

        self.watermark = seq;
        let received_at = Local::now();
        info!("{} MSG received at {}", seq, received_at.format("%Y-%m-%d %H:%M:%S"));

        Some(ValidatedFrame { seq, received_at })
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FLAG, SEQ_OFFSET};

    fn load(receiver: &mut Receiver, flag: u8, seq: u64) {
        receiver.buffer = [0; FRAME_LEN_MAX];
        receiver.buffer[0] = flag;
        receiver.buffer[SEQ_OFFSET..SEQ_OFFSET + 8].copy_from_slice(&seq.to_le_bytes());
    }

    #[test]
    fn watermark_only_moves_up() {
        let mut receiver = Receiver::new();

        let mut accepted = Vec::new();
        for seq in [5, 3, 7, 7, 10] {
            load(&mut receiver, FLAG, seq);
            if let Some(frame) = receiver.validate() {
                accepted.push(frame.seq);
            }
        }

        assert_eq!(accepted, vec![5, 7, 10]);
        assert_eq!(receiver.watermark(), 10);
    }

    #[test]
    fn foreign_flag_is_dropped_regardless_of_sequence() {
        let mut receiver = Receiver::new();

        load(&mut receiver, 0xC5, 99);
        assert_eq!(receiver.validate(), None);
        assert_eq!(receiver.watermark(), 0);
    }

    #[test]
    fn cleared_buffer_never_validates() {
        // An oversized frame skips the copy, so validation sees the cleared
        // buffer from the top of the cycle.
        let mut receiver = Receiver::new();
        assert_eq!(receiver.validate(), None);
    }
}
