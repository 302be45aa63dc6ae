use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::BitBus;

/// Software-emulated shift register over three GPIO lines.
///
/// Drives the clock and data-out pins directly and samples data-in
/// once per rising clock edge, eight times per byte. All pins must
/// share one GPIO error type.
pub struct BitBangBus<SCK, MOSI, MISO, D> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    delay: D,
    half_period_ns: u32,
}

impl<SCK, MOSI, MISO, D, E> BitBangBus<SCK, MOSI, MISO, D>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    D: DelayNs,
    E: core::fmt::Debug,
{
    /// Take ownership of the pins and park the bus in its idle state
    /// (clock low, data-out low).
    pub fn new(
        mut sck: SCK,
        mut mosi: MOSI,
        miso: MISO,
        delay: D,
        half_period_ns: u32,
    ) -> Result<Self, E> {
        sck.set_low()?;
        mosi.set_low()?;
        Ok(BitBangBus {
            sck,
            mosi,
            miso,
            delay,
            half_period_ns,
        })
    }

    /// Release the pins and the delay provider.
    pub fn free(self) -> (SCK, MOSI, MISO, D) {
        (self.sck, self.mosi, self.miso, self.delay)
    }
}

impl<SCK, MOSI, MISO, D, E> BitBus for BitBangBus<SCK, MOSI, MISO, D>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    D: DelayNs,
    E: core::fmt::Debug,
{
    type Error = E;

    fn exchange(&mut self, v: u8) -> Result<u8, E> {
        let mut inbound = 0u8;
        for bit in (0..8).rev() {
            if (v >> bit) & 1 != 0 {
                self.mosi.set_high()?;
            } else {
                self.mosi.set_low()?;
            }
            self.delay.delay_ns(self.half_period_ns);
            self.sck.set_high()?;
            inbound <<= 1;
            if self.miso.is_high()? {
                inbound |= 1;
            }
            self.delay.delay_ns(self.half_period_ns);
            self.sck.set_low()?;
        }
        // leave data-out low between bytes
        self.mosi.set_low()?;
        Ok(inbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Pin-level mode-0 slave. Latches MOSI on the rising clock edge
    /// and advances its response bit on the falling edge, so the
    /// current bit is stable while the master samples.
    struct Slave {
        sck: bool,
        mosi: bool,
        response: u8,
        out_bit: u8,
        captured: u8,
    }

    impl Slave {
        fn new(response: u8) -> RefCell<Self> {
            RefCell::new(Slave {
                sck: false,
                mosi: false,
                response,
                out_bit: 0,
                captured: 0,
            })
        }

        fn miso_level(&self) -> bool {
            if self.out_bit < 8 {
                (self.response >> (7 - self.out_bit)) & 1 != 0
            } else {
                false
            }
        }
    }

    struct Sck<'a>(&'a RefCell<Slave>);
    struct Mosi<'a>(&'a RefCell<Slave>);
    struct Miso<'a>(&'a RefCell<Slave>);
    struct NoDelay;

    impl ErrorType for Sck<'_> {
        type Error = Infallible;
    }
    impl OutputPin for Sck<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let mut s = self.0.borrow_mut();
            if s.sck {
                s.out_bit += 1;
            }
            s.sck = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut s = self.0.borrow_mut();
            if !s.sck {
                let mosi = s.mosi as u8;
                s.captured = (s.captured << 1) | mosi;
            }
            s.sck = true;
            Ok(())
        }
    }

    impl ErrorType for Mosi<'_> {
        type Error = Infallible;
    }
    impl OutputPin for Mosi<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().mosi = false;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().mosi = true;
            Ok(())
        }
    }

    impl ErrorType for Miso<'_> {
        type Error = Infallible;
    }
    impl InputPin for Miso<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.borrow().miso_level())
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.borrow().miso_level())
        }
    }

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn bus(slave: &RefCell<Slave>) -> BitBangBus<Sck<'_>, Mosi<'_>, Miso<'_>, NoDelay> {
        BitBangBus::new(Sck(slave), Mosi(slave), Miso(slave), NoDelay, 0).unwrap()
    }

    #[test]
    fn exchange_is_full_duplex_msb_first() {
        let slave = Slave::new(0x3C);
        let mut bus = bus(&slave);
        assert_eq!(bus.exchange(0xA5).unwrap(), 0x3C);
        assert_eq!(slave.borrow().captured, 0xA5);
    }

    #[test]
    fn get_clocks_zeroes_out() {
        let slave = Slave::new(0x81);
        let mut bus = bus(&slave);
        assert_eq!(bus.get().unwrap(), 0x81);
        assert_eq!(slave.borrow().captured, 0x00);
    }

    #[test]
    fn put_discards_inbound_byte() {
        let slave = Slave::new(0xFF);
        let mut bus = bus(&slave);
        bus.put(0x55).unwrap();
        assert_eq!(slave.borrow().captured, 0x55);
    }

    #[test]
    fn clock_idles_low_after_exchange() {
        let slave = Slave::new(0x00);
        let mut bus = bus(&slave);
        bus.exchange(0xFF).unwrap();
        assert!(!slave.borrow().sck);
        assert!(!slave.borrow().mosi);
    }
}
