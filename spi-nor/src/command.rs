use bitbus::BitBus;
use embedded_hal::digital::OutputPin;

use crate::address::ByteAddress;
use crate::error::NorError;

/// A bit bus paired with its active-low chip-select line.
///
/// Every command the flash understands is one select-scoped frame: the
/// 1-byte opcode, an optional 3-byte address sent most-significant
/// byte first, and the payload clocked in or out. The select line is
/// released on every exit path, including transport faults mid-frame;
/// the first error encountered is the one reported.
pub struct FramedBus<B, CS> {
    bus: B,
    cs: CS,
}

impl<B, CS> FramedBus<B, CS>
where
    B: BitBus,
    CS: OutputPin,
{
    pub fn new(bus: B, cs: CS) -> Self {
        FramedBus { bus, cs }
    }

    /// Park the select line high; the bus is idle afterwards.
    pub fn release(&mut self) -> Result<(), NorError<B::Error, CS::Error>> {
        self.cs.set_high().map_err(NorError::Pin)
    }

    /// Give the transport and select pin back.
    pub fn free(self) -> (B, CS) {
        (self.bus, self.cs)
    }

    /// Frame an outbound command: opcode, optional address, data.
    pub fn command(
        &mut self,
        opcode: u8,
        addr: Option<ByteAddress>,
        data: &[u8],
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        self.framed(|bus| {
            Self::header(bus, opcode, addr)?;
            for &b in data {
                bus.put(b)?;
            }
            Ok(())
        })
    }

    /// Frame an inbound command: opcode, optional address, then clock
    /// `buf.len()` bytes out of the device.
    pub fn command_read(
        &mut self,
        opcode: u8,
        addr: Option<ByteAddress>,
        buf: &mut [u8],
    ) -> Result<(), NorError<B::Error, CS::Error>> {
        self.framed(|bus| {
            Self::header(bus, opcode, addr)?;
            for b in buf.iter_mut() {
                *b = bus.get()?;
            }
            Ok(())
        })
    }

    fn framed<R>(
        &mut self,
        f: impl FnOnce(&mut B) -> Result<R, B::Error>,
    ) -> Result<R, NorError<B::Error, CS::Error>> {
        self.cs.set_low().map_err(NorError::Pin)?;
        let res = f(&mut self.bus).map_err(NorError::Bus);
        // deselect even when the transfer failed
        let cs_res = self.cs.set_high().map_err(NorError::Pin);
        let out = res?;
        cs_res?;
        Ok(out)
    }

    fn header(bus: &mut B, opcode: u8, addr: Option<ByteAddress>) -> Result<(), B::Error> {
        bus.put(opcode)?;
        if let Some(addr) = addr {
            let a = addr.as_u32();
            bus.put((a >> 16) as u8)?;
            bus.put((a >> 8) as u8)?;
            bus.put(a as u8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Debug)]
    struct BusFault;

    /// Records outbound bytes, answers with a counter-derived byte and
    /// optionally fails at a fixed byte index.
    struct RecBus {
        sent: [u8; 16],
        n: usize,
        fail_at: Option<usize>,
    }

    impl RecBus {
        fn new(fail_at: Option<usize>) -> Self {
            RecBus {
                sent: [0; 16],
                n: 0,
                fail_at,
            }
        }
    }

    impl BitBus for RecBus {
        type Error = BusFault;

        fn exchange(&mut self, v: u8) -> Result<u8, BusFault> {
            if self.fail_at == Some(self.n) {
                return Err(BusFault);
            }
            self.sent[self.n] = v;
            self.n += 1;
            Ok(0x40 | self.n as u8)
        }
    }

    #[derive(Default)]
    struct CsLog {
        level_high: bool,
        selects: usize,
        deselects: usize,
    }

    struct CsProbe<'a>(&'a RefCell<CsLog>);

    impl ErrorType for CsProbe<'_> {
        type Error = Infallible;
    }
    impl OutputPin for CsProbe<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let mut log = self.0.borrow_mut();
            log.level_high = false;
            log.selects += 1;
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut log = self.0.borrow_mut();
            log.level_high = true;
            log.deselects += 1;
            Ok(())
        }
    }

    #[test]
    fn frames_opcode_address_payload() {
        let cs = RefCell::new(CsLog::default());
        let mut framed = FramedBus::new(RecBus::new(None), CsProbe(&cs));
        framed
            .command(0x02, Some(ByteAddress::new(0x01_2345)), &[0xAA, 0xBB])
            .unwrap();
        let (bus, _) = framed.free();
        assert_eq!(&bus.sent[..bus.n], &[0x02, 0x01, 0x23, 0x45, 0xAA, 0xBB]);
        let log = cs.borrow();
        assert!(log.level_high);
        assert_eq!((log.selects, log.deselects), (1, 1));
    }

    #[test]
    fn read_clocks_zeroes_and_captures_inbound() {
        let cs = RefCell::new(CsLog::default());
        let mut framed = FramedBus::new(RecBus::new(None), CsProbe(&cs));
        let mut buf = [0u8; 3];
        framed
            .command_read(0x03, Some(ByteAddress::new(0x10)), &mut buf)
            .unwrap();
        // inbound bytes follow the 4 header bytes
        assert_eq!(buf, [0x45, 0x46, 0x47]);
        let (bus, _) = framed.free();
        assert_eq!(&bus.sent[4..7], &[0, 0, 0]);
    }

    #[test]
    fn no_address_commands_are_one_byte() {
        let cs = RefCell::new(CsLog::default());
        let mut framed = FramedBus::new(RecBus::new(None), CsProbe(&cs));
        framed.command(0x06, None, &[]).unwrap();
        let (bus, _) = framed.free();
        assert_eq!(&bus.sent[..bus.n], &[0x06]);
    }

    #[test]
    fn select_released_on_bus_fault() {
        let cs = RefCell::new(CsLog::default());
        let mut framed = FramedBus::new(RecBus::new(Some(2)), CsProbe(&cs));
        let res = framed.command(0x02, Some(ByteAddress::new(0)), &[0xAA]);
        assert!(matches!(res, Err(NorError::Bus(BusFault))));
        let log = cs.borrow();
        assert!(log.level_high);
        assert_eq!(log.deselects, 1);
    }
}
