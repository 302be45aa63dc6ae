//! Blocking command layer for [SerialNor] parts.
//!
//! The `*_cmd` methods frame exactly one command each and never poll.
//! The compound methods below them bundle write-enable, the command
//! and the busy wait into the sequence the datasheet prescribes.

use bitbus::BitBus;
use embedded_hal::digital::OutputPin;

use crate::address::{AddressConversions, ByteAddress, SectorIndex};
use crate::command::FramedBus;
use crate::error::NorError;
use crate::SerialNor;

type CmdResult<B, CS> = Result<
    (),
    NorError<<B as BitBus>::Error, <CS as embedded_hal::digital::ErrorType>::Error>,
>;

pub trait SerialNorBlocking<B: BitBus, CS: OutputPin>: SerialNor + AddressConversions {
    // ============= Commands =============

    /// Read the status register.
    fn read_status_cmd(
        &self,
        bus: &mut FramedBus<B, CS>,
    ) -> Result<u8, NorError<B::Error, CS::Error>> {
        let mut status = [0u8; 1];
        bus.command_read(Self::STATUS_READ_COMMAND, None, &mut status)?;
        Ok(status[0])
    }

    /// Set the write-enable latch. The device clears it again after
    /// the next program or erase completes.
    fn write_enable_cmd(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        bus.command(Self::WRITE_ENABLE_COMMAND, None, &[])
    }

    /// Read `buf.len()` bytes starting at `addr` in one frame; the
    /// device increments the address internally.
    fn read_cmd(
        &self,
        bus: &mut FramedBus<B, CS>,
        addr: ByteAddress,
        buf: &mut [u8],
    ) -> CmdResult<B, CS> {
        bus.command_read(Self::READ_COMMAND, Some(addr), buf)
    }

    /// Program one byte at `addr`. Requires the write-enable latch and
    /// an erased location; bits can only be cleared.
    fn program_cmd(
        &self,
        bus: &mut FramedBus<B, CS>,
        addr: ByteAddress,
        value: u8,
    ) -> CmdResult<B, CS> {
        bus.command(Self::PROGRAM_COMMAND, Some(addr), &[value])
    }

    /// Start erasing one sector. Requires the write-enable latch.
    fn sector_erase_cmd(
        &self,
        bus: &mut FramedBus<B, CS>,
        sector: SectorIndex,
    ) -> CmdResult<B, CS> {
        bus.command(
            Self::SECTOR_ERASE_COMMAND,
            Some(Self::sector_to_byte_address(sector)),
            &[],
        )
    }

    /// Start erasing the whole device. Requires the write-enable latch.
    fn chip_erase_cmd(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        bus.command(Self::CHIP_ERASE_COMMAND, None, &[])
    }

    /// Unlock the status register for the write that must follow.
    fn enable_write_status_cmd(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        bus.command(Self::ENABLE_WRITE_STATUS_COMMAND, None, &[])
    }

    /// Write the status register. Must be preceded, in its own frame,
    /// by [Self::enable_write_status_cmd].
    fn write_status_cmd(&self, bus: &mut FramedBus<B, CS>, value: u8) -> CmdResult<B, CS> {
        bus.command(Self::STATUS_WRITE_COMMAND, None, &[value])
    }

    // ============= Status =============

    /// Whether a program or erase is in progress.
    fn is_busy(
        &self,
        bus: &mut FramedBus<B, CS>,
    ) -> Result<bool, NorError<B::Error, CS::Error>> {
        Ok(self.read_status_cmd(bus)? & Self::STATUS_BUSY != 0)
    }

    /// Whether the write-enable latch is set.
    fn is_write_enabled(
        &self,
        bus: &mut FramedBus<B, CS>,
    ) -> Result<bool, NorError<B::Error, CS::Error>> {
        Ok(self.read_status_cmd(bus)? & Self::STATUS_WEL != 0)
    }

    /// Poll the status register until the device goes idle.
    fn wait_idle(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        while self.is_busy(bus)? {}
        Ok(())
    }

    // ============= Compound operations =============

    /// Program one byte and wait for it to land.
    fn program_byte(
        &self,
        bus: &mut FramedBus<B, CS>,
        addr: ByteAddress,
        value: u8,
    ) -> CmdResult<B, CS> {
        self.write_enable_cmd(bus)?;
        self.program_cmd(bus, addr, value)?;
        self.wait_idle(bus)
    }

    /// Erase one sector to all-ones and wait for completion.
    fn erase_sector(
        &self,
        bus: &mut FramedBus<B, CS>,
        sector: SectorIndex,
    ) -> CmdResult<B, CS> {
        self.write_enable_cmd(bus)?;
        self.sector_erase_cmd(bus, sector)?;
        self.wait_idle(bus)
    }

    /// Erase the whole device to all-ones and wait for completion.
    fn erase_chip(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        self.write_enable_cmd(bus)?;
        self.chip_erase_cmd(bus)?;
        self.wait_idle(bus)
    }

    /// Clear the block-protection bits, which power up set on SST25
    /// parts. Until this runs, every program and erase is ignored.
    fn clear_protection(&self, bus: &mut FramedBus<B, CS>) -> CmdResult<B, CS> {
        self.enable_write_status_cmd(bus)?;
        self.write_status_cmd(bus, 0x00)
    }
}
