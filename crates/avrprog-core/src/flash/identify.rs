//! Target identification

#[cfg(feature = "std")]
use crate::device::{AvrPart, DeviceDatabase};
use crate::device::Signature;
use crate::error::Result;
use crate::programmer::IspTransport;
use crate::protocol;

use super::guard::ResetGuard;

/// Read the target's signature bytes
///
/// Enters programming mode for the duration of the read and releases the
/// target afterwards. The caller maps the signature to a part, see
/// `DeviceDatabase::identify`.
pub fn read_device_signature<T: IspTransport + ?Sized>(transport: &mut T) -> Result<Signature> {
    let mut target = ResetGuard::enter(transport)?;
    protocol::enable_memory_access(&mut *target)?;
    let signature = Signature(protocol::read_signature(&mut *target)?);
    target.release()?;

    log::debug!("Read device signature {}", signature);
    Ok(signature)
}

/// Identify the attached part
///
/// Reads the signature and looks it up in `db`. A signature of all `00` or
/// all `FF` means nothing answered and is reported as
/// [`Error::DeviceNotFound`](crate::Error::DeviceNotFound).
#[cfg(feature = "std")]
pub fn probe<'db, T: IspTransport + ?Sized>(
    transport: &mut T,
    db: &'db DeviceDatabase,
) -> Result<&'db AvrPart> {
    let signature = read_device_signature(transport)?;
    let part = db.identify(signature)?;
    log::info!("Found {} (signature {})", part.name, signature);
    Ok(part)
}
