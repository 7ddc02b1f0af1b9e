//! Beacon frame layout
//!
//! The frames exchanged by the TX and RX firmware are adjusted from an
//! 802.15.4e blink: a flag byte marking the frame as ours, a reserved byte,
//! an eight-byte little-endian sequence number, and a two-byte CRC the
//! device appends on transmission.
//!
//! ```text
//! offset  0     1         2..10     10..12
//!         FLAG  reserved  sequence  CRC (device-generated)
//! ```

/// The marker value carried in the first byte of every beacon frame
pub const FLAG: u8 = 0xAB;

/// Offset of the sequence number within the frame
pub const SEQ_OFFSET: usize = 2;

/// Total length of a beacon frame on air, CRC included
pub const FRAME_LEN: usize = 12;

/// Number of payload bytes written to the device for transmission
///
/// The device appends the two CRC bytes itself.
pub const PAYLOAD_LEN: usize = FRAME_LEN - 2;

/// Builds the payload of a beacon frame carrying `seq`
pub fn encode_beacon(seq: u64) -> [u8; PAYLOAD_LEN] {
    let mut payload = [0; PAYLOAD_LEN];
    payload[0] = FLAG;
    payload[SEQ_OFFSET..SEQ_OFFSET + 8].copy_from_slice(&seq.to_le_bytes());
    payload
}

/// Returns whether `frame` carries the beacon marker
///
/// Frames without the marker are not part of this protocol; the receiver
/// drops them without raising an error.
pub fn is_beacon(frame: &[u8]) -> bool {
    frame.first() == Some(&FLAG)
}

/// Extracts the sequence number from a beacon frame
///
/// Returns `None` when the frame is too short to hold one.
pub fn sequence_number(frame: &[u8]) -> Option<u64> {
    let bytes = frame.get(SEQ_OFFSET..SEQ_OFFSET + 8)?;
    // The slice is exactly 8 bytes here, so the conversion can't fail.
    Some(u64::from_le_bytes(bytes.try_into().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_round_trip() {
        let payload = encode_beacon(0x0102_0304_0506_0708);
        assert!(is_beacon(&payload));
        assert_eq!(sequence_number(&payload), Some(0x0102_0304_0506_0708));
    }

    #[test]
    fn sequence_number_is_little_endian() {
        let payload = encode_beacon(1);
        assert_eq!(payload[SEQ_OFFSET], 1);
        assert_eq!(&payload[SEQ_OFFSET + 1..], &[0; 7][..]);
    }

    #[test]
    fn frames_without_marker_are_not_beacons() {
        let mut payload = encode_beacon(42);
        payload[0] = 0xC5;
        assert!(!is_beacon(&payload));
    }

    #[test]
    fn short_frame_has_no_sequence_number() {
        assert_eq!(sequence_number(&[FLAG, 0, 1, 2]), None);
    }
}
