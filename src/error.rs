//! Error types for simbin.
//!
//! Decoding problems caused by the bytes themselves are grouped under
//! [`FormatError`]; everything the underlying sink or source reports is passed
//! through as [`SimBinError::Io`]. Errors tied to a record carry its
//! zero-based index in the stream.

use thiserror::Error;

/// Malformed or truncated stream contents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The stream ended before the 4-byte option word was complete
    #[error("stream header unreadable: expected 4 bytes, got {available}")]
    HeaderUnreadable {
        /// Bytes present before end of stream
        available: usize,
    },

    /// The stream ended inside a record
    #[error("record {record}: stream ended inside field `{field}`")]
    Truncated {
        /// Index of the incomplete record
        record: usize,
        /// Field that could not be read in full
        field: &'static str,
    },

    /// The option word selects a width with no byte size
    #[error("unsupported {field} precision selector {code:#04b}")]
    UnsupportedPrecision {
        /// Precision field carrying the selector
        field: &'static str,
        /// Raw selector value
        code: u8,
    },

    /// A one-byte flag field held something other than 0 or 1
    #[error("record {record}: field `{field}` holds {value}, expected 0 or 1")]
    InvalidFlag {
        /// Index of the offending record
        record: usize,
        /// Flag field name
        field: &'static str,
        /// Byte found in the stream
        value: u8,
    },

    /// Bytes consumed for a record differ from the length its layout implies
    #[error("record {record}: consumed {actual} bytes, layout requires {expected}")]
    LengthMismatch {
        /// Index of the offending record
        record: usize,
        /// Length computed from the option word and section counts
        expected: usize,
        /// Bytes actually consumed
        actual: usize,
    },
}

/// The main error type for simbin operations.
#[derive(Error, Debug)]
pub enum SimBinError {
    /// The stream contents are malformed
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The byte sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record value does not fit the width the option word selects
    #[error("record {record}: {field} value {value} does not fit in {width} bytes")]
    ValueOutOfRange {
        /// Index of the offending record
        record: usize,
        /// Field name
        field: &'static str,
        /// Value that was rejected
        value: i128,
        /// Configured width in bytes
        width: usize,
    },

    /// A finite value overflows the 32-bit float width
    #[error("record {record}: {field} value {value} overflows a 32-bit float")]
    FloatOutOfRange {
        /// Index of the offending record
        record: usize,
        /// Field name
        field: &'static str,
        /// Value that was rejected
        value: f64,
    },

    /// A record's shape contradicts the option word
    #[error("record {record}: {reason}")]
    InvalidRecord {
        /// Index of the offending record
        record: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Stream configuration could not be parsed or rendered
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimBinError {
    /// Index of the record the error belongs to, if any.
    pub fn record_index(&self) -> Option<usize> {
        match self {
            SimBinError::Format(FormatError::Truncated { record, .. })
            | SimBinError::Format(FormatError::InvalidFlag { record, .. })
            | SimBinError::Format(FormatError::LengthMismatch { record, .. })
            | SimBinError::ValueOutOfRange { record, .. }
            | SimBinError::FloatOutOfRange { record, .. }
            | SimBinError::InvalidRecord { record, .. } => Some(*record),
            _ => None,
        }
    }

    /// True for errors caused by the stream contents rather than I/O.
    pub fn is_format(&self) -> bool {
        matches!(self, SimBinError::Format(_))
    }
}

/// A specialized `Result` type for simbin operations.
pub type Result<T> = std::result::Result<T, SimBinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimBinError::from(FormatError::Truncated {
            record: 7,
            field: "event id",
        });
        assert_eq!(
            err.to_string(),
            "format error: record 7: stream ended inside field `event id`"
        );

        let err = FormatError::UnsupportedPrecision {
            field: "origin id",
            code: 3,
        };
        assert_eq!(
            err.to_string(),
            "unsupported origin id precision selector 0b11"
        );
    }

    #[test]
    fn test_record_index() {
        let err = SimBinError::ValueOutOfRange {
            record: 3,
            field: "event id",
            value: 1 << 40,
            width: 4,
        };
        assert_eq!(err.record_index(), Some(3));
        assert!(!err.is_format());

        let err = SimBinError::from(FormatError::HeaderUnreadable { available: 2 });
        assert_eq!(err.record_index(), None);
        assert!(err.is_format());

        let err = SimBinError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(err.record_index(), None);
    }
}
