//! RX diagnostic capture firmware
//!
//! Waits for beacon frames and writes one CIR capture file per accepted
//! frame into the data directory. Runs until terminated externally.

use std::path::Path;
use std::process;

use log::error;

use dw1000_cir::platform::Dw1000;
use dw1000_cir::{CaptureSession, RadioConfig};

/// Where capture files are written
const DATA_DIR: &str = "data";

fn main() {
    env_logger::init();

    if let Err(error) = std::fs::create_dir_all(DATA_DIR) {
        error!("unable to create {}: {}", DATA_DIR, error);
        process::exit(1);
    }

    let device = match Dw1000::init(RadioConfig::default()) {
        Ok(device) => device,
        Err(error) => {
            error!("INIT FAILED: {}", error);
            process::exit(1);
        }
    };

    let mut session = CaptureSession::new(device, Path::new(DATA_DIR));
    if let Err(error) = session.run() {
        error!("capture loop aborted: {}", error);
        process::exit(1);
    }
}
