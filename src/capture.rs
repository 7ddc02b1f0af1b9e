//! The RX capture session
//!
//! Ties the pipeline together: frames come in through the [`Receiver`], each
//! accepted frame triggers a CIR read, and the taps go out through the
//! persistence sink. The session owns the device handle, the receiver state
//! and the reusable capture buffer, so one loop iteration never depends on
//! hidden state elsewhere.

use std::path::PathBuf;

use log::warn;

use crate::cir::{self, CIR_LEN};
use crate::device::DeviceAccess;
use crate::receiver::{Receiver, ValidatedFrame};
use crate::sink;

/// A running capture session
pub struct CaptureSession<D> {
    device: D,
    receiver: Receiver,
    cir_buffer: [u8; CIR_LEN],
    out_dir: PathBuf,
}

impl<D: DeviceAccess> CaptureSession<D> {
    /// Creates a session writing captures into `out_dir`
    ///
    /// The directory must already exist; the session never creates it.
    pub fn new(device: D, out_dir: impl Into<PathBuf>) -> Self {
        CaptureSession {
            device,
            receiver: Receiver::new(),
            cir_buffer: [0; CIR_LEN],
            out_dir: out_dir.into(),
        }
    }

    /// The highest sequence number accepted so far
    pub fn watermark(&self) -> u64 {
        self.receiver.watermark()
    }

    /// Ends the session, handing the device back
    pub fn into_device(self) -> D {
        self.device
    }

    /// Runs the capture loop forever
    ///
    /// Only device transport failures end the loop; everything else is
    /// handled within a cycle. Termination is otherwise external (signal).
    pub fn run(&mut self) -> Result<(), D::Error> {
        loop {
            self.cycle()?;
        }
    }

    /// Runs one receive cycle, capturing and persisting on acceptance
    ///
    /// Returns the accepted frame, if any, so callers driving the session
    /// manually can observe what happened.
    pub fn cycle(&mut self) -> Result<Option<ValidatedFrame>, D::Error> {
        // Discard the previous capture before the next sampling.
        self.cir_buffer = [0; CIR_LEN];

        let frame = match self.receiver.receive_cycle(&mut self.device)? {
            Some(frame) => frame,
            None => return Ok(None),
        };

        cir::read_cir(&mut self.device, &mut self.cir_buffer)?;
        let taps = cir::taps(&self.cir_buffer);

        // File trouble costs us one capture, never the session.
        if let Err(error) = sink::save(
            &self.out_dir,
            &frame.received_at.naive_local(),
            frame.seq,
            &taps,
        ) {
            warn!("unable to write capture for sequence {}: {}", frame.seq, error);
        }

        Ok(Some(frame))
    }
}
