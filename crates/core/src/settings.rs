//! Persisted console settings.
//!
//! The sound switch, the last menu row and the random generator register are
//! written to a small file so they survive a restart of the simulator.
//! Serialized with bincode and deflate-compressed.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "JPST"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::joystick::Calibration;
use crate::menu::{MenuContext, LAST_POSITION};
use crate::random::Random;

/// Magic bytes identifying a settings file.
const MAGIC: &[u8; 4] = b"JPST";
/// Current settings format version.
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub sound_enabled: bool,
    pub menu_position: u8,
    pub rng_state: u16,
    pub calibration: Calibration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sound_enabled: true,
            menu_position: 0,
            rng_state: crate::random::SEED,
            calibration: Calibration::default(),
        }
    }
}

impl Settings {
    /// Snapshot the live state.
    pub fn capture(menu: &MenuContext, rng: &Random, calibration: Calibration) -> Self {
        Settings {
            sound_enabled: menu.sound_enabled(),
            menu_position: menu.position(),
            rng_state: rng.state(),
            calibration,
        }
    }

    /// Rebuild the menu context and generator from a validated snapshot.
    pub fn restore(&self) -> Result<(MenuContext, Random), String> {
        self.validate()?;
        let rng = Random::from_state(self.rng_state)
            .ok_or_else(|| "RNG state is zero".to_string())?;
        Ok((MenuContext::restore(self.menu_position, self.sound_enabled), rng))
    }

    fn validate(&self) -> Result<(), String> {
        if self.menu_position > LAST_POSITION {
            return Err(format!("Menu position {} out of range (max {})",
                self.menu_position, LAST_POSITION));
        }
        if self.rng_state == 0 {
            return Err("RNG state is zero".into());
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        let payload = bincode::serialize(self)
            .map_err(|e| format!("Serialize error: {}", e))?;
        let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

        let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        if data.len() < HEADER_LEN {
            return Err("File too small".into());
        }
        if &data[0..4] != MAGIC {
            return Err("Invalid settings file (bad magic)".into());
        }
        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != FORMAT_VERSION {
            return Err(format!("Unsupported settings version {} (expected {})",
                version, FORMAT_VERSION));
        }
        let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[HEADER_LEN..])
            .map_err(|e| format!("Decompress error: {:?}", e))?;
        let settings: Settings = bincode::deserialize(&decompressed)
            .map_err(|e| format!("Deserialize error: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Save settings to file.
pub fn save_to_file(settings: &Settings, path: &Path) -> Result<(), String> {
    let out = settings.to_bytes()?;
    std::fs::write(path, &out)
        .map_err(|e| format!("Write error: {}", e))
}

/// Load settings from file, verifying magic, version and ranges.
pub fn load_from_file(path: &Path) -> Result<Settings, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Read error: {}", e))?;
    Settings::from_bytes(&data)
}
