//! Persistence of CIR captures
//!
//! Each accepted frame produces one plain-text file: one `real,imag` line
//! per tap, in tap order, no header. The filename is derived from the
//! acceptance timestamp and the sequence number, so distinct accepted frames
//! never collide even within the same second.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};
use log::info;

use crate::cir::CirTap;

/// Renders the capture filename for an acceptance timestamp and sequence
///
/// Components are unpadded decimal local-time fields:
/// `<year><month><day><hour><minute><second>_<seq>.txt`.
pub fn capture_path(dir: &Path, timestamp: &NaiveDateTime, seq: u64) -> PathBuf {
    dir.join(format!(
        "{}{}{}{}{}{}_{}.txt",
        timestamp.year(),
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second(),
        seq,
    ))
}

/// Writes the taps of one capture to its file
///
/// Truncates any existing file at the derived path. Every write is checked;
/// a short write surfaces as an error rather than a silently truncated
/// capture. Callers treat failures as non-fatal and keep receiving.
pub fn save(
    dir: &Path,
    timestamp: &NaiveDateTime,
    seq: u64,
    taps: &[CirTap],
) -> io::Result<PathBuf> {
    let path = capture_path(dir, timestamp, seq);

    let mut file = BufWriter::new(File::create(&path)?);
    for tap in taps {
        writeln!(file, "{},{}", tap.real, tap.imag)?;
    }
    file.flush()?;

    info!("saved {} taps to {}", taps.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap()
    }

    #[test]
    fn filename_is_deterministic_and_unpadded() {
        let path = capture_path(Path::new("data"), &timestamp(), 42);
        assert_eq!(path, Path::new("data/202134567_42.txt"));

        // Same inputs, same name.
        assert_eq!(path, capture_path(Path::new("data"), &timestamp(), 42));
    }

    #[test]
    fn sequence_number_separates_same_second_captures() {
        let a = capture_path(Path::new("data"), &timestamp(), 1);
        let b = capture_path(Path::new("data"), &timestamp(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn saved_taps_parse_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let taps = vec![
            CirTap { real: 0, imag: 0 },
            CirTap { real: -1, imag: 32767 },
            CirTap { real: 1234, imag: -32768 },
        ];

        let path = save(dir.path(), &timestamp(), 7, &taps).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let parsed: Vec<CirTap> = contents
            .lines()
            .map(|line| {
                let (real, imag) = line.split_once(',').unwrap();
                CirTap {
                    real: real.parse().unwrap(),
                    imag: imag.parse().unwrap(),
                }
            })
            .collect();

        assert_eq!(parsed, taps);
    }

    #[test]
    fn unwritable_directory_reports_an_error() {
        let missing = Path::new("/nonexistent/captures");
        assert!(save(missing, &timestamp(), 1, &[]).is_err());
    }
}
