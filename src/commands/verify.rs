//! Verify command implementation

use avrprog_core::device::DeviceDatabase;
use avrprog_core::firmware;
use avrprog_core::flash::{self, VerifyOutcome, VerifyReport};
use avrprog_core::programmer::IspTransport;
use std::path::Path;

use super::probe::resolve_part;
use super::progress::IndicatifProgress;

/// Run the verify command
pub fn run_verify<T: IspTransport + ?Sized>(
    port: &mut T,
    db: &DeviceDatabase,
    part: Option<&str>,
    input: &Path,
    start_address: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = firmware::load(input, start_address)?;
    println!(
        "Read {} bytes from {:?} ({})",
        loaded.image.len(),
        input,
        loaded.format
    );

    let part = resolve_part(port, db, part)?;

    let mut progress = IndicatifProgress::new();
    let report = match flash::verify_image(port, &part.profile, &loaded.image, &mut progress) {
        Ok(report) => report,
        Err(e) => {
            progress.abandon("Verification aborted");
            return Err(e.into());
        }
    };

    if let Some(err) = mismatch_error(&report) {
        progress.abandon("Verification failed!");
        return Err(err);
    }

    progress.finish("Verification passed");
    println!("Verified {} bytes", report.bytes_verified);

    Ok(())
}

/// The error to exit with when a verification pass found a difference
pub(super) fn mismatch_error(report: &VerifyReport) -> Option<Box<dyn std::error::Error>> {
    match report.outcome {
        VerifyOutcome::Match => None,
        VerifyOutcome::Mismatch {
            offset,
            expected,
            actual,
        } => Some(
            format!(
                "Verification failed at address 0x{:05X} (segment offset 0x{:X}): expected 0x{:02X}, got 0x{:02X}",
                report.segment_address + offset,
                offset,
                expected,
                actual
            )
            .into(),
        ),
    }
}
