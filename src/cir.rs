//! Channel impulse response extraction
//!
//! Accumulator memory holds one complex tap per sample: a 16-bit real part
//! followed by a 16-bit imaginary part, little endian. The memory can only
//! be read through the device access layer in bounded chunks, and every
//! physical read is prefixed by one dummy byte (see
//! [`DeviceAccess::read_accumulator_memory`]), so assembling a capture means
//! stitching chunk payloads together at increasing offsets.

use log::trace;

use crate::device::DeviceAccess;

/// Number of complex taps captured per accepted frame
///
/// A full accumulator capture would be 992 taps at 16 MHz PRF or 1016 taps
/// at 64 MHz PRF; 100 taps around the start of the accumulator are plenty
/// for first-path diagnostics and keep captures quick.
pub const CIR_SAMPLES: usize = 100;

/// Size of each capture in bytes (4 bytes per complex tap)
pub const CIR_LEN: usize = 4 * CIR_SAMPLES;

/// Bytes of accumulator memory read per bus transaction, dummy byte excluded
pub const ACC_CHUNK: usize = 64;

/// One complex sample of the channel impulse response
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CirTap {
    /// Real component
    pub real: i16,
    /// Imaginary component
    pub imag: i16,
}

/// Fills `buf` with accumulator memory starting at offset 0
///
/// Issues reads of `min(remaining, ACC_CHUNK)` bytes, plus one byte for the
/// dummy prefix of each physical read, and copies only the payload into
/// `buf`. The read whose requested size is below the full chunk size is the
/// final one; when `buf` is no longer than a chunk, that is the very first
/// read.
pub fn read_cir<D: DeviceAccess>(device: &mut D, buf: &mut [u8]) -> Result<(), D::Error> {
    let mut loc = 0;

    while loc < buf.len() {
        let to_read = (buf.len() - loc).min(ACC_CHUNK);

        // Cleared every iteration, like the frame buffer at the top of a
        // receive cycle.
        let mut chunk = [0; ACC_CHUNK + 1];
        device.read_accumulator_memory(&mut chunk[..to_read + 1], loc as u16)?;

        // Byte 0 of every chunk is the dummy byte; payload starts at 1.
        buf[loc..loc + to_read].copy_from_slice(&chunk[1..to_read + 1]);
        loc += to_read;
    }

    trace!("read {} bytes of accumulator memory", loc);
    Ok(())
}

/// Reinterprets a capture buffer as complex taps
///
/// `buf` must be a multiple of 4 bytes long; trailing bytes short of a full
/// tap are ignored.
pub fn taps(buf: &[u8]) -> Vec<CirTap> {
    buf.chunks_exact(4)
        .map(|tap| CirTap {
            real: i16::from_le_bytes([tap[0], tap[1]]),
            imag: i16::from_le_bytes([tap[2], tap[3]]),
        })
        .collect()
}
