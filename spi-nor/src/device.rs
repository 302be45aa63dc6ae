use bitbus::BitBus;
use embedded_hal::digital::OutputPin;

use crate::address::{ByteAddress, SectorIndex};
use crate::cmd_blocking::SerialNorBlocking;
use crate::command::FramedBus;
use crate::error::NorError;

/// A serial NOR chip behind a framed bus.
///
/// Pairs the transport with a device marker and keeps the state of the
/// incremental write session: the cursor where the next byte lands and
/// the sector most recently erased for the session. Consecutive
/// [Self::write_incremental] calls continue where the previous one
/// stopped; [Self::begin_write] starts a fresh session and forgets the
/// old one.
pub struct SpiNorDevice<B, CS, D> {
    bus: FramedBus<B, CS>,
    device: D,
    cursor: ByteAddress,
    erased: Option<SectorIndex>,
}

impl<B, CS, D: core::fmt::Debug> core::fmt::Debug for SpiNorDevice<B, CS, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiNorDevice")
            .field("device", &self.device)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl<B, CS, D> SpiNorDevice<B, CS, D>
where
    B: BitBus,
    CS: OutputPin,
    D: SerialNorBlocking<B, CS>,
{
    pub fn new(bus: B, cs: CS, device: D) -> Self {
        SpiNorDevice {
            bus: FramedBus::new(bus, cs),
            device,
            cursor: ByteAddress::new(0),
            erased: None,
        }
    }

    /// Park the select line; call once before the first command.
    pub fn init(&mut self) -> Result<(), NorError<B::Error, CS::Error>> {
        self.bus.release()
    }

    /// Give the transport, select pin and device marker back.
    pub fn free(self) -> (B, CS, D) {
        let (bus, cs) = self.bus.free();
        (bus, cs, self.device)
    }

    // ============= Reads =============

    pub fn read_byte(
        &mut self,
        addr: ByteAddress,
    ) -> Result<u8, NorError<B::Error, CS::Error>> {
        let mut buf = [0u8; 1];
        self.device.read_cmd(&mut self.bus, addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian 16-bit word.
    pub fn read_word(
        &mut self,
        addr: ByteAddress,
    ) -> Result<u16, NorError<B::Error, CS::Error>> {
        let mut buf = [0u8; 2];
        self.device.read_cmd(&mut self.bus, addr, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Fill `buf` starting at `addr`, in a single frame.
    pub fn read_array(
        &mut self,
        addr: ByteAddress,
        buf: &mut [u8],
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        trace!("read {} bytes @ {:#x}", buf.len(), addr.as_u32());
        self.device.read_cmd(&mut self.bus, addr, buf)
    }

    // ============= Direct writes =============

    /// Program one byte. The location must already be erased; bits
    /// can only be cleared.
    pub fn write_byte(
        &mut self,
        addr: ByteAddress,
        value: u8,
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        self.device.program_byte(&mut self.bus, addr, value)
    }

    /// Program a little-endian 16-bit word, low byte first.
    pub fn write_word(
        &mut self,
        addr: ByteAddress,
        value: u16,
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        let bytes = value.to_le_bytes();
        self.device.program_byte(&mut self.bus, addr, bytes[0])?;
        self.device.program_byte(&mut self.bus, addr + 1, bytes[1])
    }

    /// Program `data` starting at `addr`, byte by byte, then read the
    /// range back and report the first byte that did not land. No
    /// erases are inserted; use the incremental session for that.
    pub fn write_array(
        &mut self,
        addr: ByteAddress,
        data: &[u8],
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        trace!("program {} bytes @ {:#x}", data.len(), addr.as_u32());
        for (i, &b) in data.iter().enumerate() {
            self.device.program_byte(&mut self.bus, addr + i as u32, b)?;
        }
        let mut buf = [0u8; 32];
        for (i, chunk) in data.chunks(buf.len()).enumerate() {
            let base = addr + (i * buf.len()) as u32;
            let back = &mut buf[..chunk.len()];
            self.device.read_cmd(&mut self.bus, base, back)?;
            if let Some(bad) = back.iter().zip(chunk).position(|(got, want)| got != want) {
                return Err(NorError::Verify(base + bad as u32));
            }
        }
        Ok(())
    }

    // ============= Erases =============

    /// Erase the sector containing `addr` to all-ones.
    pub fn sector_erase(
        &mut self,
        addr: ByteAddress,
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        let sector = D::byte_to_sector_index(addr);
        debug!("erase sector {}", sector.as_u16());
        self.device.erase_sector(&mut self.bus, sector)
    }

    /// Erase the whole device to all-ones.
    pub fn chip_erase(&mut self) -> Result<(), NorError<B::Error, CS::Error>> {
        debug!("chip erase");
        self.device.erase_chip(&mut self.bus)
    }

    // ============= Status =============

    pub fn read_status(&mut self) -> Result<u8, NorError<B::Error, CS::Error>> {
        self.device.read_status_cmd(&mut self.bus)
    }

    pub fn is_write_busy(&mut self) -> Result<bool, NorError<B::Error, CS::Error>> {
        self.device.is_busy(&mut self.bus)
    }

    /// Clear the block-protection bits, which power up set. Until this
    /// runs, the chip silently ignores every program and erase.
    pub fn reset_write_protection(
        &mut self,
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        debug!("clear block protection");
        self.device.clear_protection(&mut self.bus)
    }

    // ============= Incremental write session =============

    /// Start a write session at `addr`. No sector is considered
    /// erased yet; the first [Self::write_incremental] call erases
    /// the sector it lands in, aligned or not.
    pub fn begin_write(&mut self, addr: ByteAddress) {
        debug!("write session @ {:#x}", addr.as_u32());
        self.cursor = addr;
        self.erased = None;
    }

    /// Program `data` at the session cursor, erasing each sector the
    /// first time the session touches it. Addresses only move forward,
    /// so remembering the last erased sector is enough to erase each
    /// one exactly once.
    pub fn write_incremental(
        &mut self,
        data: &[u8],
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        trace!(
            "incremental: {} bytes @ {:#x}",
            data.len(),
            self.cursor.as_u32()
        );
        for &b in data {
            let sector = D::byte_to_sector_index(self.cursor);
            if self.erased != Some(sector) {
                self.device.erase_sector(&mut self.bus, sector)?;
                self.erased = Some(sector);
            }
            self.device.program_byte(&mut self.bus, self.cursor, b)?;
            self.cursor += 1;
        }
        Ok(())
    }
}
