//! The TX beacon
//!
//! Sends a batch of sequence-numbered beacon frames at a fixed rate, one
//! frame per time slot. The receiver's dedup watermark relies on the
//! sequence numbers increasing, which the batch loop guarantees by
//! construction.

use std::thread;
use std::time::{Duration, Instant};

use log::info;

use crate::device::{regs, DeviceAccess};
use crate::frame;

/// Number of frames sent per batch
pub const BATCH_NUM: u64 = 100;

/// Length of the slot each frame is sent in
pub const TX_SLOT: Duration = Duration::from_millis(50);

/// The fixed-rate beacon sender
pub struct Beacon<D> {
    device: D,
}

impl<D: DeviceAccess> Beacon<D> {
    /// Creates a beacon around an initialized device
    pub fn new(device: D) -> Self {
        Beacon { device }
    }

    /// Hands the device back
    pub fn into_device(self) -> D {
        self.device
    }

    /// Sends `count` frames with sequence numbers `1..=count`
    ///
    /// Each frame occupies one slot of [`TX_SLOT`]; the remainder of a slot
    /// after the frame is on air is spent sleeping.
    pub fn send_batch(&mut self, count: u64) -> Result<(), D::Error> {
        for seq in 1..=count {
            let slot_start = Instant::now();

            self.send(seq)?;
            info!("{} MSG sent", seq);

            if let Some(remaining) = TX_SLOT.checked_sub(slot_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        Ok(())
    }

    /// Sends one beacon frame and waits until it is on air
    fn send(&mut self, seq: u64) -> Result<(), D::Error> {
        let payload = frame::encode_beacon(seq);

        self.device.write_tx_data(&payload)?;
        self.device.write_tx_frame_control(frame::FRAME_LEN as u8)?;
        self.device.start_transmit()?;

        // Frame-sent lives in the first status byte; spin until it fires.
        while self.device.read_status()? & regs::SYS_STATUS_TXFRS == 0 {}
        self.device.write_status(regs::SYS_STATUS_TXFRS)?;

        Ok(())
    }
}
