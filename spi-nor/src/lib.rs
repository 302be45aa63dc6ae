#![no_std]

//! Driver core for SST25-class serial NOR flash over a bit-level bus.
//!
//! The stack has three layers, leaves first:
//!
//! - [bitbus::BitBus] exchanges single bytes over the physical bus,
//!   either bit-banged or through a hardware shift register.
//! - [FramedBus] scopes one command per chip-select window: opcode,
//!   optional 3-byte address (MSB first), payload.
//! - [SpiNorDevice] runs the read/program/erase operations and the
//!   incremental write session that amortizes sector erases while a
//!   large buffer is streamed in across many small calls.
//!
//! A chip is described by a marker type implementing [SerialNor]
//! (capacity plus the command table; the SST25 defaults usually
//! suffice) and [cmd_blocking::SerialNorBlocking]. See the `sst25`
//! crate for the concrete SST25VF parts.
//!
//! NOR programming can only clear bits. A byte reads back as written
//! only if its location was erased beforehand; otherwise it holds the
//! AND of old and new contents. Sector erases are the scarce resource
//! the session logic exists to conserve.

// Must be first to share macros across the crate
pub(crate) mod fmt;

pub mod address;
pub mod cmd_blocking;
pub mod command;
mod device;
pub mod error;

pub use address::{AddressConversions, ByteAddress, SectorIndex};
pub use command::FramedBus;
pub use device::SpiNorDevice;
pub use error::NorError;

/// Layout and command table of an SST25-class serial NOR part.
///
/// The command defaults match the SST25VF series; a part with a
/// different table overrides the constants.
pub trait SerialNor {
    /// Total capacity in bytes.
    const CAPACITY: u32;
    /// Size of the erase granule in bytes.
    const SECTOR_SIZE: u32 = 4096;
    /// Number of erase granules in the device.
    const SECTOR_COUNT: u32 = Self::CAPACITY / Self::SECTOR_SIZE;

    // Commands
    /// Read data, auto-incrementing the internal address.
    const READ_COMMAND: u8 = 0x03;
    /// Program one previously erased byte.
    const PROGRAM_COMMAND: u8 = 0x02;
    /// Set the write-enable latch.
    const WRITE_ENABLE_COMMAND: u8 = 0x06;
    /// Read the status register.
    const STATUS_READ_COMMAND: u8 = 0x05;
    /// Erase the whole device to all-ones.
    const CHIP_ERASE_COMMAND: u8 = 0x60;
    /// Erase one sector to all-ones.
    const SECTOR_ERASE_COMMAND: u8 = 0x20;
    /// Unlock the status register for the write that must follow.
    const ENABLE_WRITE_STATUS_COMMAND: u8 = 0x50;
    /// Write the status register.
    const STATUS_WRITE_COMMAND: u8 = 0x01;

    // Status register bits
    /// Program or erase in progress.
    const STATUS_BUSY: u8 = 0x01;
    /// Write-enable latch; one-shot, cleared by the device after every
    /// program or erase.
    const STATUS_WEL: u8 = 0x02;
    /// Block-protection bits BP0..BP3; set at power-on on SST25 parts.
    const STATUS_PROTECT: u8 = 0x3C;
}
