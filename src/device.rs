//! The device access layer
//!
//! Everything above this module talks to the DW1000 through the
//! [`DeviceAccess`] trait, which captures the handful of synchronous
//! operations the capture and beacon loops need. The real implementation
//! lives in the [`platform`] module; tests substitute a scripted mock.
//!
//! [`platform`]: crate::platform

use core::fmt;

/// Register file constants for the DW1000
///
/// Ids and bit positions are from the DW1000 register map (user manual,
/// section 7.1). Only the registers this firmware touches are listed.
pub mod regs {
    /// Device identifier register
    pub const DEV_ID: u8 = 0x00;
    /// Transmit frame control register
    pub const TX_FCTRL: u8 = 0x08;
    /// Transmit data buffer
    pub const TX_BUFFER: u8 = 0x09;
    /// System control register
    pub const SYS_CTRL: u8 = 0x0D;
    /// System event status register
    pub const SYS_STATUS: u8 = 0x0F;
    /// RX frame information register
    pub const RX_FINFO: u8 = 0x10;
    /// Receive data buffer
    pub const RX_BUFFER: u8 = 0x11;
    /// CIR accumulator memory
    pub const ACC_MEM: u8 = 0x25;
    /// Channel control register
    pub const CHAN_CTRL: u8 = 0x1F;
    /// Power management and system control register
    pub const PMSC: u8 = 0x36;

    /// The value DEV_ID reads as on a functioning DW1000
    pub const DEV_ID_VALUE: u32 = 0xDECA0130;

    /// Transmit frame sent
    pub const SYS_STATUS_TXFRS: u32 = 0x0000_0080;
    /// Receiver PHY header error
    pub const SYS_STATUS_RXPHE: u32 = 0x0000_1000;
    /// Receiver FCS good
    pub const SYS_STATUS_RXFCG: u32 = 0x0000_4000;
    /// Receiver FCS error
    pub const SYS_STATUS_RXFCE: u32 = 0x0000_8000;
    /// Receiver Reed-Solomon frame sync loss
    pub const SYS_STATUS_RXRFSL: u32 = 0x0001_0000;
    /// Receiver frame wait timeout
    pub const SYS_STATUS_RXRFTO: u32 = 0x0002_0000;
    /// Leading edge detection processing error
    pub const SYS_STATUS_LDEERR: u32 = 0x0004_0000;
    /// Preamble detection timeout
    pub const SYS_STATUS_RXPTO: u32 = 0x0020_0000;
    /// Receiver SFD timeout
    pub const SYS_STATUS_RXSFDTO: u32 = 0x0400_0000;
    /// Automatic frame filtering rejection
    pub const SYS_STATUS_AFFREJ: u32 = 0x2000_0000;

    /// All receiver error events, cleared as one mask after a bad receive
    pub const SYS_STATUS_ALL_RX_ERR: u32 = SYS_STATUS_RXPHE
        | SYS_STATUS_RXFCE
        | SYS_STATUS_RXRFSL
        | SYS_STATUS_RXSFDTO
        | SYS_STATUS_AFFREJ
        | SYS_STATUS_LDEERR;

    /// All receiver timeout events
    pub const SYS_STATUS_ALL_RX_TO: u32 = SYS_STATUS_RXRFTO | SYS_STATUS_RXPTO;

    /// RX frame length field of RX_FINFO, extended (1023-byte) range
    pub const RX_FINFO_RXFL_MASK_1023: u32 = 0x0000_03FF;

    /// SYS_CTRL: suppress auto-FCS transmission
    pub const SYS_CTRL_SFCST: u32 = 0x0000_0001;
    /// SYS_CTRL: start transmission
    pub const SYS_CTRL_TXSTRT: u32 = 0x0000_0002;
    /// SYS_CTRL: transceiver off
    pub const SYS_CTRL_TRXOFF: u32 = 0x0000_0040;
    /// SYS_CTRL: enable receiver
    pub const SYS_CTRL_RXENAB: u32 = 0x0000_0100;
    /// SYS_CTRL: receiver delayed enable
    pub const SYS_CTRL_RXDLYE: u32 = 0x0000_0200;
}

/// How reception is activated
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RxMode {
    /// Start listening immediately
    Immediate,
    /// Start listening at the programmed delayed-receive time
    Delayed,
}

/// Blocking access to the DW1000
///
/// All operations are synchronous and either complete fully or fail with the
/// implementation's transport error. No partial-length semantics exist at
/// this layer; callers size their buffers and the implementation transfers
/// exactly that many bytes.
pub trait DeviceAccess {
    /// The transport error produced by this implementation
    type Error: fmt::Debug;

    /// Read the lower 32 bits of the system event status register
    ///
    /// The status register is 5 bytes long, but every event this firmware
    /// polls for lives in the first 4, so a 32-bit read suffices.
    fn read_status(&mut self) -> Result<u32, Self::Error>;

    /// Clear the status bits set in `mask`
    ///
    /// Status bits are write-one-to-clear; writing the mask back acknowledges
    /// the events without disturbing other bits.
    fn write_status(&mut self, mask: u32) -> Result<(), Self::Error>;

    /// Read a 32-bit register by id
    fn read_register(&mut self, id: u8) -> Result<u32, Self::Error>;

    /// Copy `buf.len()` bytes of the received frame, starting at `offset`
    fn read_frame(&mut self, buf: &mut [u8], offset: u16) -> Result<(), Self::Error>;

    /// Read accumulator (CIR) memory starting at `offset`
    ///
    /// Fills the whole of `buf`. The first byte returned by every
    /// accumulator-memory access is a dummy byte produced by the device's
    /// read pipeline and must be discarded by the caller; `buf[0]` never
    /// holds sample data. This is a fixed property of the interface, not an
    /// artifact of any particular implementation.
    fn read_accumulator_memory(&mut self, buf: &mut [u8], offset: u16)
        -> Result<(), Self::Error>;

    /// Reset the receiver, reinitializing internal symbol-acquisition state
    ///
    /// Required after any RX error before reception can be re-enabled.
    fn reset_receiver(&mut self) -> Result<(), Self::Error>;

    /// Enable the receiver
    fn enable_receive(&mut self, mode: RxMode) -> Result<(), Self::Error>;

    /// Write frame data into the transmit buffer at offset 0
    ///
    /// The final two bytes of the transmitted frame are the CRC the device
    /// appends on its own; `data` carries only the payload bytes.
    fn write_tx_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Program the transmit frame control for a frame of `len` bytes
    ///
    /// `len` includes the two CRC bytes the device appends.
    fn write_tx_frame_control(&mut self, len: u8) -> Result<(), Self::Error>;

    /// Start an immediate transmission
    fn start_transmit(&mut self) -> Result<(), Self::Error>;
}
