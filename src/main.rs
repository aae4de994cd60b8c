//! avrprog - AVR in-system flash programmer
//!
//! Programs the flash memory of AVR microcontrollers through their serial
//! programming interface: a SPI bus plus a GPIO holding the target in reset.
//!
//! # Architecture
//!
//! - `avrprog-core` implements the ISP protocol and the erase, page write
//!   and verify sequences against the `IspTransport` trait
//! - Backend crates (`avrprog-linux-spi`, `avrprog-linux-gpio`,
//!   `avrprog-dummy`) implement that trait for real or emulated hardware
//! - This binary parses the command line, opens a programmer and runs one
//!   command against it

mod cli;
mod commands;
mod programmers;

use avrprog_core::device::DeviceDatabase;
use clap::Parser;
use cli::{Cli, Commands};
use programmers::open_programmer;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load device database
    let db = match load_device_database(cli.device_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load device database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} device definitions", db.len());

    match cli.command {
        Commands::Probe { target } => {
            let mut port = open_programmer(&target.programmer, &db)?;
            commands::run_probe(&mut port, &db)
        }
        Commands::Write {
            target,
            input,
            verify,
            start_address,
            no_erase,
        } => {
            let mut port = open_programmer(&target.programmer, &db)?;
            commands::run_write(
                &mut port,
                &db,
                target.part.as_deref(),
                &input,
                start_address,
                verify,
                no_erase,
            )
        }
        Commands::Verify {
            target,
            input,
            start_address,
        } => {
            let mut port = open_programmer(&target.programmer, &db)?;
            commands::run_verify(&mut port, &db, target.part.as_deref(), &input, start_address)
        }
        Commands::Erase { target } => {
            let mut port = open_programmer(&target.programmer, &db)?;
            commands::run_erase(&mut port, &db, target.part.as_deref())
        }
        Commands::ListDevices { filter } => {
            commands::list_devices(&db, filter.as_deref());
            Ok(())
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

/// Load the built-in part table plus any user definitions
///
/// User definitions replace built-in parts with the same signature.
fn load_device_database(path: Option<&Path>) -> Result<DeviceDatabase, Box<dyn std::error::Error>> {
    let mut db = DeviceDatabase::builtin()?;

    if let Some(path) = path {
        let count = if path.is_dir() {
            db.load_dir(path)?
        } else if path.is_file() {
            db.load_file(path)?
        } else {
            return Err(format!("Device database path not found: {}", path.display()).into());
        };
        log::info!("Loaded {} device definitions from {}", count, path.display());
    }

    Ok(db)
}
