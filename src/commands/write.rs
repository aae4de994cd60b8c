//! Write command implementation

use avrprog_core::device::DeviceDatabase;
use avrprog_core::firmware;
use avrprog_core::flash::{self, WriteOptions};
use avrprog_core::programmer::IspTransport;
use std::path::Path;

use super::probe::resolve_part;
use super::progress::IndicatifProgress;
use super::verify::mismatch_error;

/// Run the write command
pub fn run_write<T: IspTransport + ?Sized>(
    port: &mut T,
    db: &DeviceDatabase,
    part: Option<&str>,
    input: &Path,
    start_address: u32,
    do_verify: bool,
    no_erase: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = firmware::load(input, start_address)?;
    let image = &loaded.image;

    println!(
        "Read {} bytes from {:?} ({}, {} segment(s))",
        image.len(),
        input,
        loaded.format,
        image.segments().len()
    );

    let part = resolve_part(port, db, part)?;
    println!(
        "Target: {} {} ({} bytes, {} byte pages)",
        part.vendor, part.name, part.profile.flash_size, part.profile.page_size
    );

    let options = WriteOptions {
        erase: !no_erase,
        verify: do_verify,
        ..Default::default()
    };

    let mut progress = IndicatifProgress::new();
    let report = match flash::write_image(port, &part.profile, image, &options, &mut progress) {
        Ok(report) => report,
        Err(e) => {
            progress.abandon("Write failed!");
            return Err(e.into());
        }
    };

    println!(
        "{} bytes written ({} pages programmed, {} blank pages skipped)",
        report.bytes_written, report.pages_written, report.pages_skipped
    );

    if let Some(verification) = &report.verification {
        if let Some(err) = mismatch_error(verification) {
            return Err(err);
        }
        println!("Verified {} bytes", verification.bytes_verified);
    }

    println!("Write complete!");

    Ok(())
}
