//! Scoped control of the target's reset line

use core::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::programmer::{IspTransport, Level};

/// Holds the target in reset for as long as it lives
///
/// Created by driving reset low. Dropping the guard drives it high again,
/// so the target is released on every exit path including early returns
/// through `?`. Use [`ResetGuard::release`] on the success path to observe
/// errors from the final reset transition.
pub struct ResetGuard<'a, T: IspTransport + ?Sized> {
    transport: &'a mut T,
    released: bool,
}

impl<'a, T: IspTransport + ?Sized> ResetGuard<'a, T> {
    /// Drive reset low and return the guard
    pub fn enter(transport: &'a mut T) -> Result<Self> {
        transport.set_reset(Level::Low)?;
        Ok(Self {
            transport,
            released: false,
        })
    }

    /// Drive reset high, reporting failure
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.transport.set_reset(Level::High)
    }
}

impl<T: IspTransport + ?Sized> Deref for ResetGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.transport
    }
}

impl<T: IspTransport + ?Sized> DerefMut for ResetGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.transport
    }
}

impl<T: IspTransport + ?Sized> Drop for ResetGuard<'_, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.transport.set_reset(Level::High) {
            log::warn!("Failed to release target reset: {}", e);
        }
    }
}
