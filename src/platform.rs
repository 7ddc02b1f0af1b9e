//! Raspberry Pi platform layer
//!
//! Implements [`DeviceAccess`] for a DW1000 wired to the Pi's SPI0 bus, with
//! the RSTn line on a GPIO pin. Transactions use the DW1000's 1-3 byte
//! header format: an operation byte carrying the write flag, sub-index flag
//! and register id, followed by up to two sub-index bytes.
//!
//! Initialization must happen below 3 MHz on the SPI clock; once the device
//! identifies itself the bus is reopened at full speed.

use std::thread;
use std::time::Duration;

use log::{debug, info};
use rppal::gpio::Gpio;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use thiserror::Error;

use crate::configs::RadioConfig;
use crate::device::{regs, DeviceAccess, RxMode};

/// GPIO pin wired to the DW1000's RSTn line
const RESET_PIN: u8 = 24;

/// SPI clock during initialization, below the 3 MHz limit
const SPI_RATE_LOW: u32 = 2_000_000;

/// SPI clock after initialization
const SPI_RATE_HIGH: u32 = 16_000_000;

/// System configuration register
const SYS_CFG: u8 = 0x04;
/// Digital receiver configuration register
const DRX_CONF: u8 = 0x27;
/// SFD detection timeout sub-register of DRX_CONF
const DRX_SFDTOC: u16 = 0x20;
/// DRX_TUNE2 sub-register of DRX_CONF
const DRX_TUNE2: u16 = 0x08;
/// Soft reset byte within the PMSC_CTRL0 register
const PMSC_SOFTRESET: u16 = 0x03;

/// A platform-level failure talking to the DW1000
#[derive(Debug, Error)]
pub enum Error {
    /// The SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    Spi(#[from] rppal::spi::Error),

    /// The reset line could not be driven
    #[error("GPIO access failed: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    /// The device did not identify as a DW1000
    #[error("device id read back as {0:#010x}, not a DW1000")]
    UnexpectedDeviceId(u32),
}

/// A DW1000 on the Raspberry Pi's SPI bus
pub struct Dw1000 {
    spi: Spi,
    config: RadioConfig,
}

impl Dw1000 {
    /// Resets, probes and configures the transceiver
    ///
    /// Fails when the SPI bus or reset GPIO cannot be opened, or when the
    /// device id register does not read back as a DW1000. Callers treat any
    /// failure here as fatal.
    pub fn init(config: RadioConfig) -> Result<Self, Error> {
        let gpio = Gpio::new()?;
        let mut reset = gpio.get(RESET_PIN)?.into_output();

        // Drive RSTn low for a period, then release it and give the chip
        // time to come out of reset.
        reset.set_low();
        thread::sleep(Duration::from_millis(2));
        reset.set_high();
        thread::sleep(Duration::from_millis(5));
        // Dropping the pin reverts it to an input, leaving RSTn to the
        // chip's internal pull-up from here on.
        drop(reset);

        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_RATE_LOW, Mode::Mode0)?;
        let mut dw1000 = Dw1000 { spi, config };

        let dev_id = dw1000.read_register(regs::DEV_ID)?;
        if dev_id != regs::DEV_ID_VALUE {
            return Err(Error::UnexpectedDeviceId(dev_id));
        }
        debug!("DEV_ID {:#010x}", dev_id);

        // Initialization done, the clock limit no longer applies.
        dw1000.spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_RATE_HIGH, Mode::Mode0)?;

        dw1000.configure()?;
        info!("DW1000 initialised and configured");

        Ok(dw1000)
    }

    /// Applies the radio configuration
    fn configure(&mut self) -> Result<(), Error> {
        let config = self.config;

        // Channel, SFD selection, PRF and preamble codes all live in
        // CHAN_CTRL.
        let mut chan_ctrl = config.channel as u32 | (config.channel as u32) << 4;
        chan_ctrl |= (config.non_standard_sfd as u32) << 17;
        chan_ctrl |= (config.pulse_repetition_frequency as u32) << 18;
        chan_ctrl |= (config.non_standard_sfd as u32) << 20;
        chan_ctrl |= (config.non_standard_sfd as u32) << 21;
        chan_ctrl |= (config.preamble_code as u32) << 22;
        chan_ctrl |= (config.preamble_code as u32) << 27;
        self.write_u32(regs::CHAN_CTRL, 0, chan_ctrl)?;

        // PHY header mode, preserving the rest of SYS_CFG.
        let mut sys_cfg = [0; 4];
        self.read(SYS_CFG, 0, &mut sys_cfg)?;
        let sys_cfg = (u32::from_le_bytes(sys_cfg) & !(0b11_u32 << 16))
            | (config.phy_header_mode as u32) << 16;
        self.write_u32(SYS_CFG, 0, sys_cfg)?;

        // Preamble acquisition and SFD timeout.
        let drx_tune2 = config
            .pac_size
            .drx_tune2(config.pulse_repetition_frequency);
        self.write(DRX_CONF, DRX_TUNE2, &drx_tune2.to_le_bytes())?;
        self.write(DRX_CONF, DRX_SFDTOC, &config.sfd_timeout.to_le_bytes())?;

        Ok(())
    }

    /// Encodes a transaction header, returning its length
    fn encode_header(write: bool, id: u8, sub: u16, header: &mut [u8; 3]) -> usize {
        let has_sub = sub > 0;
        header[0] = ((write as u8) << 7) | (((has_sub as u8) << 6) & 0x40) | (id & 0x3F);
        if !has_sub {
            return 1;
        }

        let extended = sub > 127;
        header[1] = ((extended as u8) << 7) | (sub & 0x7F) as u8;
        if !extended {
            return 2;
        }

        header[2] = ((sub & 0x7F80) >> 7) as u8;
        3
    }

    /// Reads `buf.len()` bytes from a register file
    ///
    /// The header and payload are clocked in one full-duplex transfer, so
    /// the chip select stays asserted for the whole transaction.
    fn read(&mut self, id: u8, sub: u16, buf: &mut [u8]) -> Result<(), Error> {
        let mut header = [0; 3];
        let header_len = Self::encode_header(false, id, sub, &mut header);

        let mut tx = vec![0; header_len + buf.len()];
        tx[..header_len].copy_from_slice(&header[..header_len]);
        let mut rx = vec![0; tx.len()];

        self.spi.transfer(&mut rx, &tx)?;
        buf.copy_from_slice(&rx[header_len..]);

        Ok(())
    }

    /// Writes `data` to a register file
    fn write(&mut self, id: u8, sub: u16, data: &[u8]) -> Result<(), Error> {
        let mut header = [0; 3];
        let header_len = Self::encode_header(true, id, sub, &mut header);

        let mut tx = Vec::with_capacity(header_len + data.len());
        tx.extend_from_slice(&header[..header_len]);
        tx.extend_from_slice(data);

        self.spi.write(&tx)?;
        Ok(())
    }

    fn read_u32(&mut self, id: u8, sub: u16) -> Result<u32, Error> {
        let mut buf = [0; 4];
        self.read(id, sub, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn write_u32(&mut self, id: u8, sub: u16, value: u32) -> Result<(), Error> {
        self.write(id, sub, &value.to_le_bytes())
    }

    /// Switches the accumulator memory clocks on or off
    ///
    /// The accumulator can only be read while its memory clock is forced on;
    /// leaving it on wastes power, so reads are bracketed by this.
    fn force_accumulator_clocks(&mut self, on: bool) -> Result<(), Error> {
        let mut pmsc = [0; 2];
        self.read(regs::PMSC, 0, &mut pmsc)?;

        if on {
            pmsc[0] = 0x48 | (pmsc[0] & 0xB3);
            pmsc[1] |= 0x80;
        } else {
            pmsc[0] &= 0xB3;
            pmsc[1] &= 0x7F;
        }

        self.write(regs::PMSC, 0, &pmsc)
    }
}

impl DeviceAccess for Dw1000 {
    type Error = Error;

    fn read_status(&mut self) -> Result<u32, Error> {
        self.read_u32(regs::SYS_STATUS, 0)
    }

    fn write_status(&mut self, mask: u32) -> Result<(), Error> {
        self.write_u32(regs::SYS_STATUS, 0, mask)
    }

    fn read_register(&mut self, id: u8) -> Result<u32, Error> {
        self.read_u32(id, 0)
    }

    fn read_frame(&mut self, buf: &mut [u8], offset: u16) -> Result<(), Error> {
        self.read(regs::RX_BUFFER, offset, buf)
    }

    fn read_accumulator_memory(&mut self, buf: &mut [u8], offset: u16) -> Result<(), Error> {
        self.force_accumulator_clocks(true)?;
        let result = self.read(regs::ACC_MEM, offset, buf);
        self.force_accumulator_clocks(false)?;
        result
    }

    fn reset_receiver(&mut self) -> Result<(), Error> {
        // Pulse the RX soft reset bit in PMSC_CTRL0.
        self.write(regs::PMSC, PMSC_SOFTRESET, &[0xE0])?;
        self.write(regs::PMSC, PMSC_SOFTRESET, &[0xF0])
    }

    fn enable_receive(&mut self, mode: RxMode) -> Result<(), Error> {
        let ctrl = match mode {
            RxMode::Immediate => regs::SYS_CTRL_RXENAB,
            RxMode::Delayed => regs::SYS_CTRL_RXENAB | regs::SYS_CTRL_RXDLYE,
        };
        self.write_u32(regs::SYS_CTRL, 0, ctrl)
    }

    fn write_tx_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.write(regs::TX_BUFFER, 0, data)
    }

    fn write_tx_frame_control(&mut self, len: u8) -> Result<(), Error> {
        let mut fctrl = (len as u32) & 0x7F;
        fctrl |= (self.config.bitrate as u32) << 13;
        fctrl |= (self.config.pulse_repetition_frequency as u32) << 16;

        // The preamble length pattern is two bits of TXPSR and two of PE.
        let pattern = self.config.preamble_length as u32;
        fctrl |= ((pattern >> 2) & 0b11) << 18;
        fctrl |= (pattern & 0b11) << 20;

        self.write_u32(regs::TX_FCTRL, 0, fctrl)
    }

    fn start_transmit(&mut self) -> Result<(), Error> {
        self.write_u32(regs::SYS_CTRL, 0, regs::SYS_CTRL_TXSTRT)
    }
}
