//! Radio configuration for the DW1000
//!
//! This module houses the parameters that control how frames are transmitted
//! and received. The default configuration matches the EVK1000's mode 3, the
//! configuration the TX and RX firmware on both ends of the link are built
//! with. A configuration is applied once at startup and never changed while
//! the firmware runs.

/// Radio configuration
///
/// Both sides of the link must use the same configuration, or frames will not
/// be received.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RadioConfig {
    /// The channel to transmit and listen on
    pub channel: UwbChannel,
    /// The pulse repetition frequency
    pub pulse_repetition_frequency: PulseRepetitionFrequency,
    /// The length of the preamble (TX only)
    pub preamble_length: PreambleLength,
    /// The preamble acquisition chunk size (RX only)
    pub pac_size: PacSize,
    /// The preamble code, used for both TX and RX
    pub preamble_code: u8,
    /// Use the Decawave-proprietary SFD sequence instead of the standard one
    pub non_standard_sfd: bool,
    /// The bitrate of the data portion of a frame
    pub bitrate: BitRate,
    /// The PHY header encoding mode
    pub phy_header_mode: PhyHeaderMode,
    /// SFD detection timeout, in preamble symbols
    ///
    /// Computed as preamble length + 1 + SFD length - PAC size.
    pub sfd_timeout: u16,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            channel: UwbChannel::Channel2,
            pulse_repetition_frequency: PulseRepetitionFrequency::Mhz64,
            preamble_length: PreambleLength::Symbols1024,
            pac_size: PacSize::Pac32,
            preamble_code: 9,
            non_standard_sfd: true,
            bitrate: BitRate::Kbps110,
            phy_header_mode: PhyHeaderMode::Standard,
            sfd_timeout: 1025 + 64 - 32,
        }
    }
}

/// The UWB channels supported by the DW1000
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UwbChannel {
    /// Channel 1, center frequency 3494.4 MHz
    Channel1 = 1,
    /// Channel 2, center frequency 3993.6 MHz
    Channel2 = 2,
    /// Channel 3, center frequency 4492.8 MHz
    Channel3 = 3,
    /// Channel 4, center frequency 3993.6 MHz, wide band
    Channel4 = 4,
    /// Channel 5, center frequency 6489.6 MHz
    Channel5 = 5,
    /// Channel 7, center frequency 6489.6 MHz, wide band
    Channel7 = 7,
}

/// The pulse repetition frequency
///
/// Determines how many CIR accumulator samples the receiver produces: 992
/// taps at 16 MHz, 1016 taps at 64 MHz.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PulseRepetitionFrequency {
    /// 16 megahertz
    Mhz16 = 0b01,
    /// 64 megahertz
    Mhz64 = 0b10,
}

impl PulseRepetitionFrequency {
    /// The number of complex taps in a full accumulator capture at this PRF
    pub fn full_cir_samples(&self) -> usize {
        match self {
            PulseRepetitionFrequency::Mhz16 => 992,
            PulseRepetitionFrequency::Mhz64 => 1016,
        }
    }
}

/// The length of the transmitted preamble
///
/// Longer preambles improve reception quality and range at the cost of
/// airtime. The bit pattern is two bits TXPSR followed by two bits PE, as
/// laid out in the TX frame control register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PreambleLength {
    /// 64 preamble symbols
    Symbols64 = 0b0100,
    /// 128 preamble symbols
    Symbols128 = 0b0101,
    /// 256 preamble symbols
    Symbols256 = 0b0110,
    /// 512 preamble symbols
    Symbols512 = 0b0111,
    /// 1024 preamble symbols
    Symbols1024 = 0b1000,
    /// 1536 preamble symbols
    Symbols1536 = 0b1001,
    /// 2048 preamble symbols
    Symbols2048 = 0b1010,
    /// 4096 preamble symbols
    Symbols4096 = 0b1100,
}

/// The preamble acquisition chunk size
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PacSize {
    /// 8 symbols, recommended for short preambles
    Pac8 = 0,
    /// 16 symbols
    Pac16 = 1,
    /// 32 symbols, recommended for 1024-symbol preambles
    Pac32 = 2,
    /// 64 symbols, recommended for the longest preambles
    Pac64 = 3,
}

impl PacSize {
    /// The DRX_TUNE2 value for this PAC size and PRF
    ///
    /// Values are from Table 33 of the DW1000 User Manual.
    pub fn drx_tune2(&self, prf: PulseRepetitionFrequency) -> u32 {
        use PulseRepetitionFrequency::*;

        match (self, prf) {
            (PacSize::Pac8, Mhz16) => 0x311A002D,
            (PacSize::Pac8, Mhz64) => 0x313B006B,
            (PacSize::Pac16, Mhz16) => 0x331A0052,
            (PacSize::Pac16, Mhz64) => 0x333B00BE,
            (PacSize::Pac32, Mhz16) => 0x351A009A,
            (PacSize::Pac32, Mhz64) => 0x353B015E,
            (PacSize::Pac64, Mhz16) => 0x371A011D,
            (PacSize::Pac64, Mhz64) => 0x373B0296,
        }
    }
}

/// The bitrate of the data portion of a frame
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitRate {
    /// 110 kilobits per second, the longest-range mode
    Kbps110 = 0b00,
    /// 850 kilobits per second
    Kbps850 = 0b01,
    /// 6.8 megabits per second
    Kbps6800 = 0b10,
}

/// The PHY header encoding mode
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PhyHeaderMode {
    /// Standard frame lengths, up to 127 bytes
    Standard = 0b00,
    /// Decawave-proprietary long frames, up to 1023 bytes
    Extended = 0b11,
}
