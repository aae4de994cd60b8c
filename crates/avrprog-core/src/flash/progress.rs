//! Progress reporting for write sessions

use super::session::WriteReport;

/// Progress callback for [`super::write_image`] and [`super::verify_image`]
pub trait WriteProgress {
    /// Called before the chip erase
    fn erasing(&mut self, flash_size: usize);

    /// Called once the erase delay has passed
    fn erase_complete(&mut self);

    /// Called when starting to program pages
    fn writing(&mut self, bytes_to_write: usize);

    /// Called after each page
    fn write_progress(&mut self, bytes_written: usize);

    /// Called when starting read-back verification
    fn verifying(&mut self, bytes_to_verify: usize);

    /// Called to update verification progress
    fn verify_progress(&mut self, bytes_verified: usize);

    /// Called when a write session completes
    fn complete(&mut self, report: &WriteReport);
}

/// A no-op progress reporter
pub struct NoProgress;

impl WriteProgress for NoProgress {
    fn erasing(&mut self, _flash_size: usize) {}
    fn erase_complete(&mut self) {}
    fn writing(&mut self, _bytes_to_write: usize) {}
    fn write_progress(&mut self, _bytes_written: usize) {}
    fn verifying(&mut self, _bytes_to_verify: usize) {}
    fn verify_progress(&mut self, _bytes_verified: usize) {}
    fn complete(&mut self, _report: &WriteReport) {}
}
