//! Probe command implementation

use avrprog_core::device::{AvrPart, DeviceDatabase};
use avrprog_core::flash;
use avrprog_core::programmer::IspTransport;

/// Pick the part to program
///
/// A name given with `--part` is looked up in the database and no
/// signature is read. Otherwise the target is probed.
pub fn resolve_part<'db, T: IspTransport + ?Sized>(
    port: &mut T,
    db: &'db DeviceDatabase,
    part: Option<&str>,
) -> Result<&'db AvrPart, Box<dyn std::error::Error>> {
    match part {
        Some(name) => {
            let part = db.find_by_name(name).ok_or_else(|| {
                format!(
                    "Unknown part: {}\nUse 'avrprog list-devices' to see known parts",
                    name
                )
            })?;
            log::info!("Using {} (signature not checked)", part.name);
            Ok(part)
        }
        None => Ok(flash::probe(port, db)?),
    }
}

/// Run the probe command
pub fn run_probe<T: IspTransport + ?Sized>(
    port: &mut T,
    db: &DeviceDatabase,
) -> Result<(), Box<dyn std::error::Error>> {
    let signature = flash::read_device_signature(port)?;
    println!("Signature:       {}", signature);

    let part = db.identify(signature)?;
    println!("Vendor:          {}", part.vendor);
    println!("Name:            {}", part.name);
    println!(
        "Flash size:      {} bytes ({} KiB)",
        part.profile.flash_size,
        part.profile.flash_size / 1024
    );
    println!(
        "Page size:       {} bytes ({} pages)",
        part.profile.page_size,
        part.profile.page_count()
    );
    println!("Erase delay:     {} ms", part.profile.erase_delay_ms);
    println!("Busy detection:  {:?}", part.profile.busy_mode);
    if part.profile.has_extended_address() {
        println!("Extended address: used above 64K words");
    }

    Ok(())
}
