use crate::address::ByteAddress;

/// Error type for framed NOR flash operations.
///
/// Generic over the transport fault channel and the chip-select pin
/// fault channel so the driver works with any pin/peripheral pairing.
/// Out-of-range addresses are undefined at the chip level rather than
/// rejected here.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NorError<BE, PE> {
    /// The byte transport failed mid-transfer.
    #[error("bus transfer failed: {0:?}")]
    Bus(BE),
    /// The chip-select line could not be driven.
    #[error("chip-select pin failed: {0:?}")]
    Pin(PE),
    /// A programmed byte read back differently, typically because its
    /// location was not erased or the chip is write-protected.
    #[error("program verify failed at {0}")]
    Verify(ByteAddress),
}
