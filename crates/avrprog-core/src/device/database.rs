//! Device database for runtime loading and lookup
//!
//! This module provides the `DeviceDatabase` type for loading AVR part
//! definitions from RON files. A table of common parts is built in.

use alloc::format;
use alloc::{string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::types::{BusyMode, DeviceProfile, Signature};
use crate::error::Error;

/// Built-in part definitions
const BUILTIN_RON: &str = include_str!("../../devices/microchip.ron");

/// Error type for device database operations
#[derive(Debug)]
pub enum DeviceDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for DeviceDbError {
    fn from(e: io::Error) -> Self {
        DeviceDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for DeviceDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        DeviceDbError::Parse(e)
    }
}

impl std::fmt::Display for DeviceDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceDbError::Io(e) => write!(f, "I/O error: {}", e),
            DeviceDbError::Parse(e) => write!(f, "Parse error: {}", e),
            DeviceDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DeviceDbError {}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
}

impl Size {
    /// Convert to bytes, `None` if the size does not fit in 32 bits
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
        }
    }
}

/// Single part definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct PartDef {
    name: String,
    signature: (u8, u8, u8),
    flash_size: Size,
    page_size: u32,
    erase_delay_ms: u32,
    #[serde(default)]
    busy_mode: BusyMode,
}

/// Vendor definition containing multiple parts
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    parts: Vec<PartDef>,
}

// ============================================================================
// Device database
// ============================================================================

fn part_from_def(vendor: &str, def: PartDef) -> Result<AvrPart, DeviceDbError> {
    let flash_size = def.flash_size.to_bytes().ok_or_else(|| {
        DeviceDbError::Validation(format!("{}: flash size does not fit in 32 bits", def.name))
    })?;
    let (s0, s1, s2) = def.signature;
    let profile = DeviceProfile {
        flash_size,
        page_size: def.page_size,
        erase_delay_ms: def.erase_delay_ms,
        busy_mode: def.busy_mode,
    };

    if profile.validate().is_err() {
        return Err(DeviceDbError::Validation(format!(
            "{}: invalid page size {}",
            def.name, profile.page_size
        )));
    }
    if profile.flash_size % profile.page_size != 0 {
        return Err(DeviceDbError::Validation(format!(
            "{}: flash size {} is not a multiple of the page size {}",
            def.name, profile.flash_size, profile.page_size
        )));
    }

    Ok(AvrPart {
        vendor: vendor.into(),
        name: def.name,
        signature: Signature([s0, s1, s2]),
        profile,
    })
}

/// A known AVR part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvrPart {
    /// Vendor name
    pub vendor: String,
    /// Part name (e.g. "ATmega328P")
    pub name: String,
    /// Device signature
    pub signature: Signature,
    /// Flash geometry and timing
    pub profile: DeviceProfile,
}

/// Runtime device database
#[derive(Debug, Clone, Default)]
pub struct DeviceDatabase {
    parts: Vec<AvrPart>,
}

impl DeviceDatabase {
    /// Create an empty device database
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Create a database holding the built-in part table
    pub fn builtin() -> Result<Self, DeviceDbError> {
        let mut db = Self::new();
        db.load_ron(BUILTIN_RON)?;
        Ok(db)
    }

    /// Load part definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, DeviceDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load part definitions from a RON string
    ///
    /// A part whose signature is already known replaces the earlier entry.
    /// If any part is invalid, nothing from `content` is added.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, DeviceDbError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let parts = vendor_def
            .parts
            .into_iter()
            .map(|part_def| part_from_def(&vendor_def.vendor, part_def))
            .collect::<Result<Vec<_>, _>>()?;
        let count = parts.len();

        for part in parts {
            self.parts.retain(|p| p.signature != part.signature);
            self.parts.push(part);
        }

        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, DeviceDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Get all parts in the database
    pub fn parts(&self) -> &[AvrPart] {
        &self.parts
    }

    /// Get the number of parts in the database
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Find a part by its signature
    pub fn find_by_signature(&self, signature: Signature) -> Option<&AvrPart> {
        self.parts.iter().find(|p| p.signature == signature)
    }

    /// Find a part by exact name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&AvrPart> {
        self.parts.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Find parts whose name contains `pattern` (case-insensitive)
    pub fn search(&self, pattern: &str) -> Vec<&AvrPart> {
        let pattern = pattern.to_lowercase();
        self.parts
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&pattern))
            .collect()
    }

    /// Map a signature read from a target to a known part
    pub fn identify(&self, signature: Signature) -> crate::Result<&AvrPart> {
        if signature.is_absent() {
            return Err(Error::DeviceNotFound);
        }
        self.find_by_signature(signature)
            .ok_or(Error::DeviceNotSupported {
                signature: signature.0,
            })
    }

    /// Iterate over all parts
    pub fn iter(&self) -> impl Iterator<Item = &AvrPart> {
        self.parts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_ron() {
        let ron = r#"
        (
            vendor: "Atmel",
            parts: [
                (
                    name: "ATmega163",
                    signature: (0x1E, 0x94, 0x02),
                    flash_size: KiB(16),
                    page_size: 128,
                    erase_delay_ms: 32,
                    busy_mode: ReadBackPoll,
                ),
                (
                    name: "ATtiny13",
                    signature: (0x1E, 0x90, 0x07),
                    flash_size: B(1024),
                    page_size: 32,
                    erase_delay_ms: 4,
                ),
            ],
        )
        "#;

        let mut db = DeviceDatabase::new();
        let count = db.load_ron(ron).unwrap();

        assert_eq!(count, 2);
        assert_eq!(db.len(), 2);

        let part = db.find_by_signature(Signature([0x1E, 0x94, 0x02])).unwrap();
        assert_eq!(part.name, "ATmega163");
        assert_eq!(part.vendor, "Atmel");
        assert_eq!(part.profile.flash_size, 16 * 1024);
        assert_eq!(part.profile.busy_mode, BusyMode::ReadBackPoll);

        let tiny = db.find_by_name("attiny13").unwrap();
        assert_eq!(tiny.profile.busy_mode, BusyMode::ReadyBusyPoll);
        assert_eq!(tiny.profile.flash_size, 1024);
    }

    #[test]
    fn test_builtin_table() {
        let db = DeviceDatabase::builtin().unwrap();
        assert!(!db.is_empty());

        let part = db.identify(Signature([0x1E, 0x95, 0x0F])).unwrap();
        assert_eq!(part.name, "ATmega328P");
        assert_eq!(part.profile.page_size, 128);
        assert_eq!(part.profile.flash_size, 32 * 1024);

        let mega = db.find_by_name("ATmega2560").unwrap();
        assert!(mega.profile.has_extended_address());
        assert_eq!(mega.profile.page_size, 256);

        for part in db.iter() {
            assert!(part.profile.validate().is_ok(), "{}", part.name);
        }
    }

    #[test]
    fn test_identify_errors() {
        let db = DeviceDatabase::builtin().unwrap();
        assert_eq!(
            db.identify(Signature([0xFF, 0xFF, 0xFF])),
            Err(Error::DeviceNotFound)
        );
        assert_eq!(
            db.identify(Signature([0x1E, 0x00, 0x42])),
            Err(Error::DeviceNotSupported {
                signature: [0x1E, 0x00, 0x42]
            })
        );
    }

    #[test]
    fn test_invalid_page_size_rejected() {
        let ron = r#"(vendor: "X", parts: [(name: "Bad", signature: (1, 2, 3),
            flash_size: KiB(8), page_size: 63, erase_delay_ms: 9)])"#;
        let mut db = DeviceDatabase::new();
        assert!(matches!(db.load_ron(ron), Err(DeviceDbError::Validation(_))));
    }

    #[test]
    fn test_oversized_flash_rejected() {
        let ron = r#"(vendor: "X", parts: [(name: "Huge", signature: (1, 2, 3),
            flash_size: KiB(4194304), page_size: 128, erase_delay_ms: 9)])"#;
        let mut db = DeviceDatabase::new();
        assert!(matches!(db.load_ron(ron), Err(DeviceDbError::Validation(_))));
        assert!(db.is_empty());
    }

    #[test]
    fn test_rejected_file_adds_nothing() {
        let ron = r#"(vendor: "X", parts: [
            (name: "Good", signature: (1, 2, 3), flash_size: KiB(8), page_size: 64, erase_delay_ms: 9),
            (name: "Bad", signature: (1, 2, 4), flash_size: KiB(8), page_size: 63, erase_delay_ms: 9),
        ])"#;
        let mut db = DeviceDatabase::builtin().unwrap();
        let before = db.len();

        assert!(db.load_ron(ron).is_err());
        assert_eq!(db.len(), before);
        assert!(db.find_by_name("Good").is_none());
    }

    #[test]
    fn test_search() {
        let db = DeviceDatabase::builtin().unwrap();
        let found = db.search("mega32");
        assert!(found.iter().any(|p| p.name == "ATmega328P"));
        assert!(found.iter().all(|p| p.name.to_lowercase().contains("mega32")));
    }
}
