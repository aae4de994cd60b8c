//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

const PROGRAMMER_HELP: &str = "Programmer to use, as name[:key=value,...] \
    (e.g. linux_spi:dev=/dev/spidev0.0,gpiochip=0,reset=25 or dummy:part=ATmega328P)";

#[derive(Parser)]
#[command(name = "avrprog")]
#[command(author, version, about = "AVR in-system flash programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Additional device definitions (a .ron file or a directory of them)
    #[arg(long, global = true)]
    pub device_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target selection shared by commands that talk to hardware
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(short, long, help = PROGRAMMER_HELP)]
    pub programmer: String,

    /// Part name (optional, identified by signature if not specified)
    #[arg(long)]
    pub part: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the target's signature and identify it
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Program a firmware file (Intel HEX or raw binary) into flash
    Write {
        #[command(flatten)]
        target: TargetArgs,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,

        /// Flash address of a raw binary image (hex or decimal, e.g. 0x1FC00)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start_address: u32,

        /// Don't erase before writing (target must already be blank)
        #[arg(long)]
        no_erase: bool,
    },

    /// Compare flash contents against a firmware file
    Verify {
        #[command(flatten)]
        target: TargetArgs,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,

        /// Flash address of a raw binary image (hex or decimal, e.g. 0x1FC00)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start_address: u32,
    },

    /// Erase the whole flash
    Erase {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List known parts
    ListDevices {
        /// Only show parts whose name contains this string
        filter: Option<String>,
    },

    /// List available programmers
    ListProgrammers,
}
