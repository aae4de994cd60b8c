//! Chip erase sequence

use crate::device::DeviceProfile;
use crate::error::Result;
use crate::programmer::IspTransport;
use crate::protocol;

use super::guard::ResetGuard;

/// Erase the whole flash
///
/// Holds the target in reset, enables programming, issues Chip Erase and
/// waits the part's erase delay. Reset is released afterwards, also when
/// any step fails.
pub fn erase_chip<T: IspTransport + ?Sized>(transport: &mut T, profile: &DeviceProfile) -> Result<()> {
    log::info!("Erasing chip ({} ms)", profile.erase_delay_ms);

    let mut target = ResetGuard::enter(transport)?;
    protocol::enable_memory_access(&mut *target)?;
    protocol::chip_erase(&mut *target)?;
    target.delay_ms(profile.erase_delay_ms);
    target.release()
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::device::BusyMode;
    use crate::error::Error;
    use crate::mock::{MockEvent, MockTarget};
    use crate::programmer::Level;
    use alloc::vec;

    #[test]
    fn test_erase_sequence() {
        let profile = DeviceProfile::new(0x8000, 128, 9000, BusyMode::ReadyBusyPoll);
        let mut target = MockTarget::new(0x8000);

        erase_chip(&mut target, &profile).unwrap();

        assert_eq!(
            target.events(),
            &[
                MockEvent::Reset(Level::Low),
                MockEvent::TransmitReceive(vec![0xAC, 0x53, 0x00, 0x00]),
                MockEvent::Delay(500_000),
                MockEvent::Transmit(vec![0xAC, 0x80, 0x00, 0x00]),
                MockEvent::Delay(9_000_000),
                MockEvent::Reset(Level::High),
            ]
        );
    }

    #[test]
    fn test_erase_releases_reset_on_transfer_error() {
        let profile = DeviceProfile::new(0x8000, 128, 9, BusyMode::ReadyBusyPoll);
        let mut target = MockTarget::new(0x8000);
        target.set_fail_transfers(true);

        assert_eq!(erase_chip(&mut target, &profile), Err(Error::SpiTransferFailed));
        assert_eq!(target.resets(), vec![Level::Low, Level::High]);
    }
}
