//! simbin - Compact Binary Event Streams for Simulated Particle Interactions
//!
//! simbin reads and writes the dense binary form of simulation output: a
//! stream of physics events, each made of a variable number of sub-records
//! (interactions, hits, origins, drift entries, ...), whose field presence and
//! widths are all controlled by a single 32-bit option word at the start of
//! the stream.
//!
//! # Key Characteristics
//!
//! - Self-describing: the 4-byte header is the whole schema
//! - Every bit position of the option word is a fixed compatibility contract
//! - Record sizes depend only on the option word and section counts
//! - No silent truncation: values that do not fit their configured width are
//!   rejected; rounding to `f32` at 32-bit binary width is the only loss
//! - One forward pass, no global state, one fixed byte order per stream
//!
//! # Architecture
//!
//! - **OptionWord**: the 32-bit flag and precision register
//! - **RecordLayout**: field widths resolved from an option word
//! - **EventRecord**: one event with its sub-record sections
//! - **StreamWriter / StreamReader**: header plus record encoding and decoding
//! - **StreamConfig**: JSON-loadable option word and byte order
//!
//! # Stream Layout
//!
//! ```text
//! header    u32 option word
//! record    event id          4 | 8 bytes
//!           veto              1 byte          (has veto)
//!           bad flags         1 byte          (has bad flags)
//!           time              8 | 12 bytes    (has time)
//!           galactic pointing 4 values        (has galactic pointing)
//!           detector rotation 6 values        (has detector rotation)
//!           horizon pointing  4 values        (has horizon pointing)
//!           per enabled section, in order interaction, hit, group, extra,
//!           origin, drift:
//!               u32 count, then count x (origin id 1|2|4, value 4|8)
//! ```
//!
//! Values are `f32` at 32-bit binary precision and `f64` at 64 bit.
//!
//! # Examples
//!
//! ```
//! use simbin::{
//!     EventRecord, OptionWord, StreamReader, StreamWriter, SubRecord, SubRecordKind,
//! };
//!
//! let mut word = OptionWord::new();
//! word.set_has_hit_records(true);
//!
//! let record = EventRecord::new(42)
//!     .with_sub_record(SubRecordKind::Hit, SubRecord::new(3, 1000.0))
//!     .with_sub_record(SubRecordKind::Hit, SubRecord::new(7, -5.5));
//!
//! let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
//! writer.write_record(&record).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = StreamReader::new(bytes.as_slice()).unwrap();
//! assert_eq!(reader.option_word(), word);
//! assert_eq!(reader.next_record().unwrap(), Some(record));
//! assert_eq!(reader.next_record().unwrap(), None);
//! ```
//!
//! # Byte Order
//!
//! Streams are little-endian unless configured otherwise. The header carries
//! no order marker, so the order is never inferred from the data.

pub mod config;
pub mod endian;
pub mod error;
pub mod layout;
pub mod option_word;
pub mod reader;
pub mod record;
pub mod writer;

// Re-exports for convenient access
pub use config::StreamConfig;
pub use endian::Endianness;
pub use error::{FormatError, Result, SimBinError};
pub use layout::RecordLayout;
pub use option_word::{OptionWord, OriginIdPrecision, TimePrecision, WordPrecision};
pub use reader::{decode_stream, Records, StreamReader};
pub use record::{AxisAngles, AxisVectors, EventRecord, SimTime, SubRecord, SubRecordKind};
pub use writer::{encode_stream, StreamWriter};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "simbin";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(ver.contains("simbin"));
        assert!(ver.contains(VERSION));
    }

    #[test]
    fn test_re_exports() {
        let _word = OptionWord::new();
        let _result: Result<()> = Ok(());
        assert_eq!(option_word::OPTION_WORD_BYTES, 4);
    }
}
