use crate::SerialNor;
use core::{
    fmt::Display,
    ops::{Add, AddAssign},
};

/// Linear byte address within the flash array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ByteAddress(pub(crate) u32);

impl ByteAddress {
    pub fn new(address: u32) -> Self {
        ByteAddress(address)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Index of the sector containing this address.
    pub fn sector_index(&self, sector_size: u32) -> SectorIndex {
        SectorIndex((self.0 / sector_size) as u16)
    }

    /// Number of bytes into the containing sector.
    pub fn sector_offset(&self, sector_size: u32) -> u32 {
        self.0 % sector_size
    }
}

impl From<ByteAddress> for u32 {
    fn from(ba: ByteAddress) -> Self {
        ba.as_u32()
    }
}

impl Add<u32> for ByteAddress {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        ByteAddress(self.0 + rhs)
    }
}

impl AddAssign<u32> for ByteAddress {
    fn add_assign(&mut self, rhs: u32) {
        self.0 += rhs;
    }
}

impl Display for ByteAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Index of an erase granule in the flash array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorIndex(pub(crate) u16);

impl SectorIndex {
    pub fn new(index: u16) -> Self {
        SectorIndex(index)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// First byte address of this sector.
    pub fn base_address(&self, sector_size: u32) -> ByteAddress {
        ByteAddress(self.0 as u32 * sector_size)
    }

    pub fn from_byte_address(ba: ByteAddress, sector_size: u32) -> Self {
        SectorIndex((ba.0 / sector_size) as u16)
    }
}

impl From<SectorIndex> for u16 {
    fn from(si: SectorIndex) -> Self {
        si.as_u16()
    }
}

impl Add<u16> for SectorIndex {
    type Output = Self;

    fn add(self, rhs: u16) -> Self::Output {
        SectorIndex(self.0 + rhs)
    }
}

impl AddAssign<u16> for SectorIndex {
    fn add_assign(&mut self, rhs: u16) {
        self.0 += rhs;
    }
}

impl Display for SectorIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Conversions between byte addresses and sector indices for a given
/// part geometry.
pub trait AddressConversions {
    fn byte_to_sector_index(addr: ByteAddress) -> SectorIndex;
    fn sector_to_byte_address(sector: SectorIndex) -> ByteAddress;
    fn sector_offset(addr: ByteAddress) -> u32;
    fn is_sector_aligned(addr: ByteAddress) -> bool;
}

impl<T: SerialNor> AddressConversions for T {
    fn byte_to_sector_index(addr: ByteAddress) -> SectorIndex {
        addr.sector_index(Self::SECTOR_SIZE)
    }
    fn sector_to_byte_address(sector: SectorIndex) -> ByteAddress {
        sector.base_address(Self::SECTOR_SIZE)
    }
    fn sector_offset(addr: ByteAddress) -> u32 {
        addr.sector_offset(Self::SECTOR_SIZE)
    }
    fn is_sector_aligned(addr: ByteAddress) -> bool {
        addr.sector_offset(Self::SECTOR_SIZE) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Geom;
    impl SerialNor for Geom {
        const CAPACITY: u32 = 64 * 4096;
    }

    #[test]
    fn sector_index_masks_low_twelve_bits() {
        assert_eq!(ByteAddress::new(0).sector_index(4096), SectorIndex::new(0));
        assert_eq!(
            ByteAddress::new(4095).sector_index(4096),
            SectorIndex::new(0)
        );
        assert_eq!(
            ByteAddress::new(4096).sector_index(4096),
            SectorIndex::new(1)
        );
        assert_eq!(
            ByteAddress::new(0x1234).sector_index(4096),
            SectorIndex::new(1)
        );
    }

    #[test]
    fn conversions_round_trip() {
        let sector = Geom::byte_to_sector_index(ByteAddress::new(3 * 4096 + 17));
        assert_eq!(sector, SectorIndex::new(3));
        assert_eq!(
            Geom::sector_to_byte_address(sector),
            ByteAddress::new(3 * 4096)
        );
        assert_eq!(Geom::sector_offset(ByteAddress::new(3 * 4096 + 17)), 17);
        assert!(Geom::is_sector_aligned(ByteAddress::new(8192)));
        assert!(!Geom::is_sector_aligned(ByteAddress::new(8193)));
    }
}
