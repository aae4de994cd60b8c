//! List commands implementation

use avrprog_core::device::DeviceDatabase;

use crate::programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();
    print!("{}", programmers::programmer_help());
}

/// List known parts, optionally filtered by name
pub fn list_devices(db: &DeviceDatabase, filter: Option<&str>) {
    let parts = match filter {
        Some(pattern) => db.search(pattern),
        None => db.iter().collect(),
    };

    println!("Supported devices:");
    println!();
    println!(
        "{:<10} {:<14} {:>10} {:>6} {:>10}  {}",
        "Vendor", "Name", "Flash", "Page", "Signature", "Busy detection"
    );
    println!("{}", "-".repeat(72));

    for part in &parts {
        println!(
            "{:<10} {:<14} {:>10} {:>6} {:>10}  {:?}",
            part.vendor,
            part.name,
            format_size(part.profile.flash_size),
            part.profile.page_size,
            part.signature.to_string(),
            part.profile.busy_mode
        );
    }

    println!();
    println!("{} device(s)", parts.len());
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
