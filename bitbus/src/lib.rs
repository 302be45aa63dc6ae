#![no_std]

//! Full-duplex byte exchange over a bit-serial bus.
//!
//! Serial flash and similar peripherals speak SPI mode 0: clock idling
//! low, data shifted most-significant bit first, inputs sampled on the
//! rising clock edge. [BitBus] captures that contract as a one-byte
//! exchange, so a driver written against it runs unchanged whether the
//! bus is a software-toggled set of GPIO lines ([BitBangBus]) or an
//! on-chip shift register ([SpiPeripheralBus]).
//!
//! Chip select is deliberately not part of this layer; command framing
//! owns it.

mod bitbang;
mod peripheral;

pub use bitbang::BitBangBus;
pub use peripheral::SpiPeripheralBus;

/// One-byte full-duplex exchange over a mode-0 serial bus.
pub trait BitBus {
    /// Fault channel of the underlying pins or peripheral.
    type Error: core::fmt::Debug;

    /// Exchange one byte, MSB first, returning the byte clocked in.
    fn exchange(&mut self, v: u8) -> Result<u8, Self::Error>;

    /// Clock one byte out, discarding whatever the slave shifted back.
    fn put(&mut self, v: u8) -> Result<(), Self::Error> {
        self.exchange(v).map(|_| ())
    }

    /// Clock one byte in. Equivalent to `exchange(0x00)`.
    fn get(&mut self) -> Result<u8, Self::Error> {
        self.exchange(0x00)
    }
}
