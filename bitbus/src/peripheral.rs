use embedded_hal::spi::SpiBus;

use crate::BitBus;

/// Bus backed by a hardware SPI peripheral.
///
/// Each exchange loads one byte into the peripheral's shift register
/// and blocks until the transfer-complete flag reports the inbound
/// byte, which is exactly the [BitBus] contract.
pub struct SpiPeripheralBus<B> {
    bus: B,
}

impl<B: SpiBus> SpiPeripheralBus<B> {
    pub fn new(bus: B) -> Self {
        SpiPeripheralBus { bus }
    }

    /// Release the peripheral.
    pub fn free(self) -> B {
        self.bus
    }
}

impl<B: SpiBus> BitBus for SpiPeripheralBus<B> {
    type Error = B::Error;

    fn exchange(&mut self, v: u8) -> Result<u8, B::Error> {
        let mut buf = [v];
        self.bus.transfer_in_place(&mut buf)?;
        self.bus.flush()?;
        Ok(buf[0])
    }
}
