//! Stream configuration.
//!
//! A [`StreamConfig`] bundles the settings a writer needs before the first
//! byte goes out: the option word and the byte order. It serializes to JSON
//! with one named field per flag, so stream layouts can be kept in version
//! control next to the simulation setup that produces them.
//!
//! # Example
//!
//! ```
//! use simbin::{Endianness, StreamConfig};
//!
//! let json = r#"{
//!     "option_word": { "event_id_precision": "bits64", "has_veto": true },
//!     "byte_order": "big"
//! }"#;
//!
//! let config = StreamConfig::from_json_str(json).unwrap();
//! assert!(config.option_word.has_veto());
//! assert_eq!(config.option_word.event_id_width(), 8);
//! assert_eq!(config.byte_order, Endianness::Big);
//! ```

use crate::endian::Endianness;
use crate::option_word::OptionWord;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings shared by the writer and reader of one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// Governing option word (written as the stream header)
    pub option_word: OptionWord,
    /// Byte order of every multi-byte field
    pub byte_order: Endianness,
}

impl StreamConfig {
    pub fn new(option_word: OptionWord, byte_order: Endianness) -> Self {
        Self {
            option_word,
            byte_order,
        }
    }

    /// Parse from JSON. Missing fields take their defaults; unknown fields
    /// are an error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save as a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
