//! OptionWord - the 32-bit schema register of a binary event stream.
//!
//! Every binary sim stream starts with one option word. Its bits decide which
//! optional fields each event record carries and how wide the variable-width
//! fields are, so a reader can size every field from the header alone.
//!
//! # Design
//!
//! - Named fields (flags and precision enums) with an explicit pack/unpack
//!   routine to and from the raw `u32`
//! - Packing goes through `bitvec` views with `Lsb0` ordering (bit 0 = LSB)
//! - Bit positions are a compatibility contract and never move; new flags may
//!   only claim bits from the reserved range
//! - Reserved bits and the unassigned origin-ID code are carried through
//!   unchanged, so `from_raw(v).to_raw() == v` for every `v`
//!
//! | bits  | meaning                                                  |
//! |-------|----------------------------------------------------------|
//! | 0     | options-word precision (0 = 32 bit, 1 = 64 bit)          |
//! | 1     | binary-value precision (0 = 32 bit, 1 = 64 bit)          |
//! | 2     | event-ID precision (0 = 32 bit, 1 = 64 bit)              |
//! | 3-4   | origin-ID precision (00 = 8, 01 = 16, 10 = 32 bit)       |
//! | 5     | time precision (0 = 64 bit, 1 = 96 bit)                  |
//! | 6-18  | presence flags, see the `BIT_HAS_*` constants            |
//! | 19-31 | reserved                                                 |
//!
//! # Examples
//!
//! ```
//! use simbin::{OptionWord, OriginIdPrecision, WordPrecision};
//!
//! let mut word = OptionWord::new();
//! word.set_event_id_precision(WordPrecision::Bits64);
//! word.set_origin_id_precision(OriginIdPrecision::Bits16);
//! word.set_has_veto(true);
//!
//! assert_eq!(word.to_raw(), 0b100_1100);
//! assert_eq!(OptionWord::from_raw(word.to_raw()), word);
//! ```

use crate::record::SubRecordKind;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Width of the serialized option word in bytes.
pub const OPTION_WORD_BYTES: usize = 4;

pub const BIT_OPTIONS_PRECISION: usize = 0;
pub const BIT_BINARY_PRECISION: usize = 1;
pub const BIT_EVENT_ID_PRECISION: usize = 2;
pub const BITS_ORIGIN_ID_PRECISION: Range<usize> = 3..5;
pub const BIT_TIME_PRECISION: usize = 5;
pub const BIT_HAS_VETO: usize = 6;
pub const BIT_HAS_BAD_FLAGS: usize = 7;
pub const BIT_HAS_ORIGINS: usize = 8;
pub const BIT_HAS_TIME: usize = 9;
pub const BIT_HAS_INTERACTION_RECORDS: usize = 10;
pub const BIT_HAS_HIT_RECORDS: usize = 11;
pub const BIT_HAS_GROUP_RECORDS: usize = 12;
pub const BIT_HAS_EXTRA_RECORDS: usize = 13;
pub const BIT_HAS_DRIFT_RECORDS: usize = 14;
pub const BIT_HAS_ONLY_SINGLE_INIT_RECORD: usize = 15;
pub const BIT_HAS_GALACTIC_POINTING: usize = 16;
pub const BIT_HAS_DETECTOR_ROTATION: usize = 17;
pub const BIT_HAS_HORIZON_POINTING: usize = 18;

/// Number of low bits with an assigned meaning.
pub const NUM_DEFINED_BITS: usize = 19;

/// Mask of the bits no accessor interprets. They round-trip untouched.
pub const RESERVED_MASK: u32 = !((1u32 << NUM_DEFINED_BITS) - 1);

// =============================================================================
// Precision Selectors
// =============================================================================

/// A 32/64-bit width choice, used for the option word, generic binary values
/// and event IDs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordPrecision {
    #[default]
    Bits32,
    Bits64,
}

impl WordPrecision {
    #[inline]
    fn from_bit(bit: bool) -> Self {
        if bit {
            WordPrecision::Bits64
        } else {
            WordPrecision::Bits32
        }
    }

    #[inline]
    fn bit(self) -> bool {
        self == WordPrecision::Bits64
    }

    /// Field width in bytes (4 or 8).
    #[inline]
    pub fn byte_width(self) -> usize {
        match self {
            WordPrecision::Bits32 => 4,
            WordPrecision::Bits64 => 8,
        }
    }
}

/// Width of origin-ID fields inside sub-records (2-bit selector).
///
/// The fourth code (`0b11`) is unassigned and has no variant; a word carrying
/// it still round-trips, but no stream can be encoded or decoded under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginIdPrecision {
    Bits8,
    Bits16,
    Bits32,
}

impl OriginIdPrecision {
    /// The unassigned selector value.
    pub const UNASSIGNED_CODE: u8 = 0b11;

    /// Decode the 2-bit selector.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0b00 => Some(OriginIdPrecision::Bits8),
            0b01 => Some(OriginIdPrecision::Bits16),
            0b10 => Some(OriginIdPrecision::Bits32),
            _ => None,
        }
    }

    /// The 2-bit selector stored in bits 3-4.
    pub fn code(self) -> u8 {
        match self {
            OriginIdPrecision::Bits8 => 0b00,
            OriginIdPrecision::Bits16 => 0b01,
            OriginIdPrecision::Bits32 => 0b10,
        }
    }

    /// Field width in bytes (1, 2 or 4).
    #[inline]
    pub fn byte_width(self) -> usize {
        match self {
            OriginIdPrecision::Bits8 => 1,
            OriginIdPrecision::Bits16 => 2,
            OriginIdPrecision::Bits32 => 4,
        }
    }

    /// Largest origin ID representable at this width.
    pub fn max_value(self) -> u32 {
        match self {
            OriginIdPrecision::Bits8 => u8::MAX as u32,
            OriginIdPrecision::Bits16 => u16::MAX as u32,
            OriginIdPrecision::Bits32 => u32::MAX,
        }
    }
}

/// Width of the event time field.
///
/// 64 bit stores unsigned total nanoseconds; 96 bit stores signed 64-bit
/// seconds followed by signed 32-bit nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    #[default]
    Bits64,
    Bits96,
}

impl TimePrecision {
    #[inline]
    fn from_bit(bit: bool) -> Self {
        if bit {
            TimePrecision::Bits96
        } else {
            TimePrecision::Bits64
        }
    }

    #[inline]
    fn bit(self) -> bool {
        self == TimePrecision::Bits96
    }

    /// Field width in bytes (8 or 12).
    #[inline]
    pub fn byte_width(self) -> usize {
        match self {
            TimePrecision::Bits64 => 8,
            TimePrecision::Bits96 => 12,
        }
    }
}

// =============================================================================
// OptionWord
// =============================================================================

/// The option word governing one binary event stream.
///
/// Built once when a stream is opened (from defaults or from the stream
/// header) and left untouched while the stream is read or written.
///
/// Serializes as one named field per flag and precision (see
/// [`OptionWordRepr`]); unknown keys and reserved values outside bits 19-31
/// are rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "OptionWordRepr", try_from = "OptionWordRepr")]
pub struct OptionWord {
    options_precision: WordPrecision,
    binary_precision: WordPrecision,
    event_id_precision: WordPrecision,
    /// Raw 2-bit selector, kept raw so the unassigned code survives.
    origin_id_code: u8,
    time_precision: TimePrecision,
    has_veto: bool,
    has_bad_flags: bool,
    has_origins: bool,
    has_time: bool,
    has_interaction_records: bool,
    has_hit_records: bool,
    has_group_records: bool,
    has_extra_records: bool,
    has_drift_records: bool,
    has_only_single_init_record: bool,
    has_galactic_pointing: bool,
    has_detector_rotation: bool,
    has_horizon_pointing: bool,
    /// Bits 19-31 exactly as read.
    reserved: u32,
}

impl OptionWord {
    /// All flags false, all precisions at their lowest width (raw value 0).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack a raw register value. Never fails.
    pub fn from_raw(raw: u32) -> Self {
        let bits = raw.view_bits::<Lsb0>();
        Self {
            options_precision: WordPrecision::from_bit(bits[BIT_OPTIONS_PRECISION]),
            binary_precision: WordPrecision::from_bit(bits[BIT_BINARY_PRECISION]),
            event_id_precision: WordPrecision::from_bit(bits[BIT_EVENT_ID_PRECISION]),
            origin_id_code: bits[BITS_ORIGIN_ID_PRECISION].load_le::<u8>(),
            time_precision: TimePrecision::from_bit(bits[BIT_TIME_PRECISION]),
            has_veto: bits[BIT_HAS_VETO],
            has_bad_flags: bits[BIT_HAS_BAD_FLAGS],
            has_origins: bits[BIT_HAS_ORIGINS],
            has_time: bits[BIT_HAS_TIME],
            has_interaction_records: bits[BIT_HAS_INTERACTION_RECORDS],
            has_hit_records: bits[BIT_HAS_HIT_RECORDS],
            has_group_records: bits[BIT_HAS_GROUP_RECORDS],
            has_extra_records: bits[BIT_HAS_EXTRA_RECORDS],
            has_drift_records: bits[BIT_HAS_DRIFT_RECORDS],
            has_only_single_init_record: bits[BIT_HAS_ONLY_SINGLE_INIT_RECORD],
            has_galactic_pointing: bits[BIT_HAS_GALACTIC_POINTING],
            has_detector_rotation: bits[BIT_HAS_DETECTOR_ROTATION],
            has_horizon_pointing: bits[BIT_HAS_HORIZON_POINTING],
            reserved: raw & RESERVED_MASK,
        }
    }

    /// Pack into the raw register value, reserved bits included.
    pub fn to_raw(&self) -> u32 {
        let mut raw = self.reserved & RESERVED_MASK;
        {
            let bits = raw.view_bits_mut::<Lsb0>();
            bits.set(BIT_OPTIONS_PRECISION, self.options_precision.bit());
            bits.set(BIT_BINARY_PRECISION, self.binary_precision.bit());
            bits.set(BIT_EVENT_ID_PRECISION, self.event_id_precision.bit());
            bits[BITS_ORIGIN_ID_PRECISION].store_le::<u8>(self.origin_id_code & 0b11);
            bits.set(BIT_TIME_PRECISION, self.time_precision.bit());
            bits.set(BIT_HAS_VETO, self.has_veto);
            bits.set(BIT_HAS_BAD_FLAGS, self.has_bad_flags);
            bits.set(BIT_HAS_ORIGINS, self.has_origins);
            bits.set(BIT_HAS_TIME, self.has_time);
            bits.set(BIT_HAS_INTERACTION_RECORDS, self.has_interaction_records);
            bits.set(BIT_HAS_HIT_RECORDS, self.has_hit_records);
            bits.set(BIT_HAS_GROUP_RECORDS, self.has_group_records);
            bits.set(BIT_HAS_EXTRA_RECORDS, self.has_extra_records);
            bits.set(BIT_HAS_DRIFT_RECORDS, self.has_drift_records);
            bits.set(BIT_HAS_ONLY_SINGLE_INIT_RECORD, self.has_only_single_init_record);
            bits.set(BIT_HAS_GALACTIC_POINTING, self.has_galactic_pointing);
            bits.set(BIT_HAS_DETECTOR_ROTATION, self.has_detector_rotation);
            bits.set(BIT_HAS_HORIZON_POINTING, self.has_horizon_pointing);
        }
        raw
    }

    /// Reserved bits (19-31) as carried by this word.
    #[inline]
    pub fn reserved_bits(&self) -> u32 {
        self.reserved & RESERVED_MASK
    }

    // =========================================================================
    // Precision Accessors
    // =========================================================================

    #[inline]
    pub fn options_precision(&self) -> WordPrecision {
        self.options_precision
    }

    #[inline]
    pub fn set_options_precision(&mut self, precision: WordPrecision) {
        self.options_precision = precision;
    }

    /// Precision of generic binary values (sub-record values, pointing).
    #[inline]
    pub fn binary_precision(&self) -> WordPrecision {
        self.binary_precision
    }

    #[inline]
    pub fn set_binary_precision(&mut self, precision: WordPrecision) {
        self.binary_precision = precision;
    }

    #[inline]
    pub fn event_id_precision(&self) -> WordPrecision {
        self.event_id_precision
    }

    #[inline]
    pub fn set_event_id_precision(&mut self, precision: WordPrecision) {
        self.event_id_precision = precision;
    }

    /// `None` when the word carries the unassigned selector `0b11`.
    #[inline]
    pub fn origin_id_precision(&self) -> Option<OriginIdPrecision> {
        OriginIdPrecision::from_code(self.origin_id_code)
    }

    #[inline]
    pub fn set_origin_id_precision(&mut self, precision: OriginIdPrecision) {
        self.origin_id_code = precision.code();
    }

    /// Raw 2-bit origin-ID selector.
    #[inline]
    pub fn origin_id_code(&self) -> u8 {
        self.origin_id_code & 0b11
    }

    #[inline]
    pub fn time_precision(&self) -> TimePrecision {
        self.time_precision
    }

    #[inline]
    pub fn set_time_precision(&mut self, precision: TimePrecision) {
        self.time_precision = precision;
    }

    // =========================================================================
    // Presence Flags
    // =========================================================================

    #[inline]
    pub fn has_veto(&self) -> bool {
        self.has_veto
    }

    #[inline]
    pub fn set_has_veto(&mut self, value: bool) {
        self.has_veto = value;
    }

    #[inline]
    pub fn has_bad_flags(&self) -> bool {
        self.has_bad_flags
    }

    #[inline]
    pub fn set_has_bad_flags(&mut self, value: bool) {
        self.has_bad_flags = value;
    }

    #[inline]
    pub fn has_origins(&self) -> bool {
        self.has_origins
    }

    #[inline]
    pub fn set_has_origins(&mut self, value: bool) {
        self.has_origins = value;
    }

    #[inline]
    pub fn has_time(&self) -> bool {
        self.has_time
    }

    #[inline]
    pub fn set_has_time(&mut self, value: bool) {
        self.has_time = value;
    }

    #[inline]
    pub fn has_interaction_records(&self) -> bool {
        self.has_interaction_records
    }

    #[inline]
    pub fn set_has_interaction_records(&mut self, value: bool) {
        self.has_interaction_records = value;
    }

    #[inline]
    pub fn has_hit_records(&self) -> bool {
        self.has_hit_records
    }

    #[inline]
    pub fn set_has_hit_records(&mut self, value: bool) {
        self.has_hit_records = value;
    }

    #[inline]
    pub fn has_group_records(&self) -> bool {
        self.has_group_records
    }

    #[inline]
    pub fn set_has_group_records(&mut self, value: bool) {
        self.has_group_records = value;
    }

    #[inline]
    pub fn has_extra_records(&self) -> bool {
        self.has_extra_records
    }

    #[inline]
    pub fn set_has_extra_records(&mut self, value: bool) {
        self.has_extra_records = value;
    }

    #[inline]
    pub fn has_drift_records(&self) -> bool {
        self.has_drift_records
    }

    #[inline]
    pub fn set_has_drift_records(&mut self, value: bool) {
        self.has_drift_records = value;
    }

    /// When set together with interaction records, the interaction section
    /// holds exactly one (init) entry and carries no count.
    #[inline]
    pub fn has_only_single_init_record(&self) -> bool {
        self.has_only_single_init_record
    }

    #[inline]
    pub fn set_has_only_single_init_record(&mut self, value: bool) {
        self.has_only_single_init_record = value;
    }

    #[inline]
    pub fn has_galactic_pointing(&self) -> bool {
        self.has_galactic_pointing
    }

    #[inline]
    pub fn set_has_galactic_pointing(&mut self, value: bool) {
        self.has_galactic_pointing = value;
    }

    #[inline]
    pub fn has_detector_rotation(&self) -> bool {
        self.has_detector_rotation
    }

    #[inline]
    pub fn set_has_detector_rotation(&mut self, value: bool) {
        self.has_detector_rotation = value;
    }

    #[inline]
    pub fn has_horizon_pointing(&self) -> bool {
        self.has_horizon_pointing
    }

    #[inline]
    pub fn set_has_horizon_pointing(&mut self, value: bool) {
        self.has_horizon_pointing = value;
    }

    // =========================================================================
    // Derived Layout Information
    // =========================================================================

    /// Whether records carry the section for `kind`.
    pub fn has_section(&self, kind: SubRecordKind) -> bool {
        match kind {
            SubRecordKind::Interaction => self.has_interaction_records,
            SubRecordKind::Hit => self.has_hit_records,
            SubRecordKind::Group => self.has_group_records,
            SubRecordKind::Extra => self.has_extra_records,
            SubRecordKind::Origin => self.has_origins,
            SubRecordKind::Drift => self.has_drift_records,
        }
    }

    /// Enabled sub-record sections, in stream order.
    pub fn sections(&self) -> impl Iterator<Item = SubRecordKind> {
        let word = *self;
        SubRecordKind::ALL
            .into_iter()
            .filter(move |kind| word.has_section(*kind))
    }

    #[inline]
    pub fn event_id_width(&self) -> usize {
        self.event_id_precision.byte_width()
    }

    #[inline]
    pub fn binary_width(&self) -> usize {
        self.binary_precision.byte_width()
    }

    /// `None` for the unassigned selector.
    #[inline]
    pub fn origin_id_width(&self) -> Option<usize> {
        self.origin_id_precision().map(OriginIdPrecision::byte_width)
    }

    #[inline]
    pub fn time_width(&self) -> usize {
        self.time_precision.byte_width()
    }
}

// =============================================================================
// Serialized Form
// =============================================================================

/// Origin-ID selector as written in configuration, including the unassigned
/// code so every word survives a round trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginIdSetting {
    #[default]
    Bits8,
    Bits16,
    Bits32,
    Unassigned,
}

impl OriginIdSetting {
    fn from_code(code: u8) -> Self {
        match OriginIdPrecision::from_code(code) {
            Some(OriginIdPrecision::Bits8) => OriginIdSetting::Bits8,
            Some(OriginIdPrecision::Bits16) => OriginIdSetting::Bits16,
            Some(OriginIdPrecision::Bits32) => OriginIdSetting::Bits32,
            None => OriginIdSetting::Unassigned,
        }
    }

    fn code(self) -> u8 {
        match self {
            OriginIdSetting::Bits8 => OriginIdPrecision::Bits8.code(),
            OriginIdSetting::Bits16 => OriginIdPrecision::Bits16.code(),
            OriginIdSetting::Bits32 => OriginIdPrecision::Bits32.code(),
            OriginIdSetting::Unassigned => OriginIdPrecision::UNASSIGNED_CODE,
        }
    }
}

/// Named-field form of an [`OptionWord`] used by serde.
///
/// Missing keys take their defaults; unknown keys are an error.
/// `reserved_bits` holds bits 19-31 in place and must not touch the low bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionWordRepr {
    pub options_precision: WordPrecision,
    pub binary_precision: WordPrecision,
    pub event_id_precision: WordPrecision,
    pub origin_id_precision: OriginIdSetting,
    pub time_precision: TimePrecision,
    pub has_veto: bool,
    pub has_bad_flags: bool,
    pub has_origins: bool,
    pub has_time: bool,
    pub has_interaction_records: bool,
    pub has_hit_records: bool,
    pub has_group_records: bool,
    pub has_extra_records: bool,
    pub has_drift_records: bool,
    pub has_only_single_init_record: bool,
    pub has_galactic_pointing: bool,
    pub has_detector_rotation: bool,
    pub has_horizon_pointing: bool,
    pub reserved_bits: u32,
}

impl From<OptionWord> for OptionWordRepr {
    fn from(word: OptionWord) -> Self {
        Self {
            options_precision: word.options_precision,
            binary_precision: word.binary_precision,
            event_id_precision: word.event_id_precision,
            origin_id_precision: OriginIdSetting::from_code(word.origin_id_code()),
            time_precision: word.time_precision,
            has_veto: word.has_veto,
            has_bad_flags: word.has_bad_flags,
            has_origins: word.has_origins,
            has_time: word.has_time,
            has_interaction_records: word.has_interaction_records,
            has_hit_records: word.has_hit_records,
            has_group_records: word.has_group_records,
            has_extra_records: word.has_extra_records,
            has_drift_records: word.has_drift_records,
            has_only_single_init_record: word.has_only_single_init_record,
            has_galactic_pointing: word.has_galactic_pointing,
            has_detector_rotation: word.has_detector_rotation,
            has_horizon_pointing: word.has_horizon_pointing,
            reserved_bits: word.reserved_bits(),
        }
    }
}

impl TryFrom<OptionWordRepr> for OptionWord {
    type Error = String;

    fn try_from(repr: OptionWordRepr) -> Result<Self, Self::Error> {
        if repr.reserved_bits & !RESERVED_MASK != 0 {
            return Err(format!(
                "reserved_bits {:#010x} sets bits below bit {}",
                repr.reserved_bits, NUM_DEFINED_BITS
            ));
        }

        Ok(Self {
            options_precision: repr.options_precision,
            binary_precision: repr.binary_precision,
            event_id_precision: repr.event_id_precision,
            origin_id_code: repr.origin_id_precision.code(),
            time_precision: repr.time_precision,
            has_veto: repr.has_veto,
            has_bad_flags: repr.has_bad_flags,
            has_origins: repr.has_origins,
            has_time: repr.has_time,
            has_interaction_records: repr.has_interaction_records,
            has_hit_records: repr.has_hit_records,
            has_group_records: repr.has_group_records,
            has_extra_records: repr.has_extra_records,
            has_drift_records: repr.has_drift_records,
            has_only_single_init_record: repr.has_only_single_init_record,
            has_galactic_pointing: repr.has_galactic_pointing,
            has_detector_rotation: repr.has_detector_rotation,
            has_horizon_pointing: repr.has_horizon_pointing,
            reserved: repr.reserved_bits,
        })
    }
}

impl From<u32> for OptionWord {
    fn from(raw: u32) -> Self {
        OptionWord::from_raw(raw)
    }
}

impl From<OptionWord> for u32 {
    fn from(word: OptionWord) -> Self {
        word.to_raw()
    }
}

impl fmt::Display for OptionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionWord({:#010x})", self.to_raw())
    }
}

impl fmt::Binary for OptionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.to_raw(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let word = OptionWord::new();
        assert_eq!(word.to_raw(), 0);
        assert_eq!(word.event_id_precision(), WordPrecision::Bits32);
        assert_eq!(word.origin_id_precision(), Some(OriginIdPrecision::Bits8));
        assert_eq!(word.time_precision(), TimePrecision::Bits64);
        assert!(!word.has_veto());
        assert_eq!(word.sections().count(), 0);
    }

    #[test]
    fn test_single_bit_positions() {
        let mut word = OptionWord::new();
        word.set_has_time(true);
        assert_eq!(word.to_raw(), 1 << BIT_HAS_TIME);

        let mut word = OptionWord::new();
        word.set_has_horizon_pointing(true);
        assert_eq!(word.to_raw(), 1 << BIT_HAS_HORIZON_POINTING);

        let mut word = OptionWord::new();
        word.set_time_precision(TimePrecision::Bits96);
        assert_eq!(word.to_raw(), 1 << BIT_TIME_PRECISION);
    }

    #[test]
    fn test_origin_id_codes() {
        let mut word = OptionWord::new();
        word.set_origin_id_precision(OriginIdPrecision::Bits16);
        assert_eq!(word.to_raw(), 0b01 << 3);
        word.set_origin_id_precision(OriginIdPrecision::Bits32);
        assert_eq!(word.to_raw(), 0b10 << 3);
        assert_eq!(word.origin_id_width(), Some(4));
    }

    #[test]
    fn test_unassigned_origin_code_survives() {
        let word = OptionWord::from_raw(0b11 << 3);
        assert_eq!(word.origin_id_precision(), None);
        assert_eq!(word.origin_id_code(), OriginIdPrecision::UNASSIGNED_CODE);
        assert_eq!(word.origin_id_width(), None);
        assert_eq!(word.to_raw(), 0b11 << 3);
    }

    #[test]
    fn test_reserved_bits_preserved() {
        let raw = 0xDEAD_0000 | (1 << BIT_HAS_VETO);
        let mut word = OptionWord::from_raw(raw);
        assert_eq!(word.reserved_bits(), raw & RESERVED_MASK);

        word.set_has_veto(false);
        word.set_has_bad_flags(true);
        assert_eq!(word.reserved_bits(), raw & RESERVED_MASK);
        assert_eq!(
            word.to_raw(),
            (raw & RESERVED_MASK) | (1 << BIT_HAS_BAD_FLAGS)
        );
    }

    #[test]
    fn test_sections_follow_flags() {
        let mut word = OptionWord::new();
        word.set_has_drift_records(true);
        word.set_has_interaction_records(true);
        word.set_has_origins(true);

        let kinds: Vec<_> = word.sections().collect();
        assert_eq!(
            kinds,
            vec![
                SubRecordKind::Interaction,
                SubRecordKind::Origin,
                SubRecordKind::Drift
            ]
        );
    }

    #[test]
    fn test_widths() {
        let mut word = OptionWord::new();
        assert_eq!(word.event_id_width(), 4);
        assert_eq!(word.binary_width(), 4);
        assert_eq!(word.time_width(), 8);

        word.set_event_id_precision(WordPrecision::Bits64);
        word.set_binary_precision(WordPrecision::Bits64);
        word.set_time_precision(TimePrecision::Bits96);
        assert_eq!(word.event_id_width(), 8);
        assert_eq!(word.binary_width(), 8);
        assert_eq!(word.time_width(), 12);
    }

    #[test]
    fn test_display() {
        let word = OptionWord::from_raw(0x0000_0241);
        assert_eq!(word.to_string(), "OptionWord(0x00000241)");
        assert_eq!(format!("{:b}", word), "1001000001");
    }

    #[test]
    fn test_serde_uses_named_precisions() {
        let mut word = OptionWord::from_raw(0x8000_0000);
        word.set_origin_id_precision(OriginIdPrecision::Bits16);

        let json = serde_json::to_string(&word).unwrap();
        assert!(json.contains("\"origin_id_precision\":\"bits16\""));
        assert!(json.contains("\"reserved_bits\":2147483648"));
        assert_eq!(serde_json::from_str::<OptionWord>(&json).unwrap(), word);

        let unassigned = OptionWord::from_raw(0b11 << 3);
        let json = serde_json::to_string(&unassigned).unwrap();
        assert!(json.contains("\"unassigned\""));
        assert_eq!(serde_json::from_str::<OptionWord>(&json).unwrap(), unassigned);
    }

    #[test]
    fn test_serde_rejects_low_reserved_bits() {
        let err = serde_json::from_str::<OptionWord>(r#"{"reserved_bits":1}"#).unwrap_err();
        assert!(err.to_string().contains("reserved_bits"));

        let word = serde_json::from_str::<OptionWord>(r#"{"reserved_bits":4294443008}"#).unwrap();
        assert_eq!(word.to_raw(), RESERVED_MASK);
    }

    #[test]
    fn test_serde_rejects_unknown_keys() {
        assert!(serde_json::from_str::<OptionWord>(r#"{"reserved":1}"#).is_err());
        assert!(serde_json::from_str::<OptionWord>(r#"{"origin_id_code":1}"#).is_err());
    }

    #[test]
    fn test_from_into_u32() {
        let word: OptionWord = 0x1234_5678u32.into();
        let raw: u32 = word.into();
        assert_eq!(raw, 0x1234_5678);
    }
}
