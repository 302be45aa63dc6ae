#![no_std]

//! SST25VF serial NOR flash devices.
//!
//! The SST25VF parts share one command table and 4 KiB sectors; they
//! differ only in capacity, so a single const-generic marker covers
//! the family. Pair a marker with a transport through
//! [spi_nor::SpiNorDevice]:
//!
//! ```ignore
//! let bus = BitBangBus::new(sck, mosi, miso, delay, 500)?;
//! let mut flash = SpiNorDevice::new(bus, cs, Sst25Vf016::new());
//! flash.init()?;
//! flash.reset_write_protection()?;
//! ```

use bitbus::BitBus;
use embedded_hal::digital::OutputPin;
use spi_nor::cmd_blocking::SerialNorBlocking;
use spi_nor::SerialNor;

/// An SST25VF part with `C` bytes of flash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sst25<const C: u32>();

impl<const C: u32> Sst25<C> {
    pub fn new() -> Self {
        Sst25()
    }
}

impl<const C: u32> SerialNor for Sst25<C> {
    const CAPACITY: u32 = C;
}

impl<B: BitBus, CS: OutputPin, const C: u32> SerialNorBlocking<B, CS> for Sst25<C> {}

/// SST25VF040, 4 Mbit.
pub type Sst25Vf040 = Sst25<0x08_0000>;
/// SST25VF016, 16 Mbit.
pub type Sst25Vf016 = Sst25<0x20_0000>;
/// SST25VF032, 32 Mbit.
pub type Sst25Vf032 = Sst25<0x40_0000>;
