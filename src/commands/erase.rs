//! Erase command implementation

use avrprog_core::device::DeviceDatabase;
use avrprog_core::flash;
use avrprog_core::programmer::IspTransport;

use super::probe::resolve_part;

/// Run the erase command
pub fn run_erase<T: IspTransport + ?Sized>(
    port: &mut T,
    db: &DeviceDatabase,
    part: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let part = resolve_part(port, db, part)?;

    println!(
        "Erasing {} ({} bytes)...",
        part.name, part.profile.flash_size
    );
    flash::erase_chip(port, &part.profile)?;
    println!("Erase complete!");

    Ok(())
}
