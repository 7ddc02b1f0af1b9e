//! TX beacon firmware
//!
//! Sends one batch of sequence-numbered beacon frames at a fixed rate, then
//! exits.

use std::process;

use log::error;

use dw1000_cir::beacon::{Beacon, BATCH_NUM};
use dw1000_cir::platform::Dw1000;
use dw1000_cir::RadioConfig;

fn main() {
    env_logger::init();

    let device = match Dw1000::init(RadioConfig::default()) {
        Ok(device) => device,
        Err(error) => {
            error!("INIT FAILED: {}", error);
            process::exit(1);
        }
    };

    let mut beacon = Beacon::new(device);
    if let Err(error) = beacon.send_batch(BATCH_NUM) {
        error!("beacon batch aborted: {}", error);
        process::exit(1);
    }
}
