//! Record layout: byte widths resolved from an option word.
//!
//! The encoded size of a record depends only on the governing option word and
//! on how many entries each enabled section holds, never on field values.
//! `RecordLayout` resolves the widths once per stream so writers can size
//! buffers and readers can check what they consumed.

use crate::error::{FormatError, Result};
use crate::option_word::OptionWord;
use crate::record::{AxisAngles, AxisVectors, EventRecord, SubRecordKind};

/// Width of a section entry count.
pub const SECTION_COUNT_BYTES: usize = 4;

/// Width of the veto and bad-flags fields.
pub const FLAG_BYTES: usize = 1;

/// Resolved field widths for one stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    word: OptionWord,
    event_id_width: usize,
    origin_id_width: usize,
    binary_width: usize,
    time_width: usize,
}

impl RecordLayout {
    /// Resolve widths, rejecting selectors with no byte size.
    ///
    /// # Examples
    ///
    /// ```
    /// use simbin::{OptionWord, RecordLayout, SubRecordKind};
    ///
    /// let mut word = OptionWord::new();
    /// word.set_has_hit_records(true);
    /// let layout = RecordLayout::new(word).unwrap();
    ///
    /// // 4-byte event ID, then a 4-byte count and 1 + 4 bytes per hit
    /// assert_eq!(layout.fixed_len(), 4);
    /// assert_eq!(layout.section_len(SubRecordKind::Hit, 2), 4 + 2 * 5);
    /// ```
    pub fn new(word: OptionWord) -> Result<Self> {
        let origin_id_width = word
            .origin_id_width()
            .ok_or(FormatError::UnsupportedPrecision {
                field: "origin id",
                code: word.origin_id_code(),
            })?;

        Ok(Self {
            word,
            event_id_width: word.event_id_width(),
            origin_id_width,
            binary_width: word.binary_width(),
            time_width: word.time_width(),
        })
    }

    #[inline]
    pub fn option_word(&self) -> OptionWord {
        self.word
    }

    #[inline]
    pub fn event_id_width(&self) -> usize {
        self.event_id_width
    }

    #[inline]
    pub fn origin_id_width(&self) -> usize {
        self.origin_id_width
    }

    #[inline]
    pub fn binary_width(&self) -> usize {
        self.binary_width
    }

    #[inline]
    pub fn time_width(&self) -> usize {
        self.time_width
    }

    /// Enabled sections in stream order.
    pub fn sections(&self) -> impl Iterator<Item = SubRecordKind> {
        self.word.sections()
    }

    /// True when `kind` is stored as a single entry without a count.
    #[inline]
    pub fn is_single_entry(&self, kind: SubRecordKind) -> bool {
        kind == SubRecordKind::Interaction
            && self.word.has_interaction_records()
            && self.word.has_only_single_init_record()
    }

    /// Bytes of everything before the first section.
    pub fn fixed_len(&self) -> usize {
        let word = &self.word;
        let mut len = self.event_id_width;
        if word.has_veto() {
            len += FLAG_BYTES;
        }
        if word.has_bad_flags() {
            len += FLAG_BYTES;
        }
        if word.has_time() {
            len += self.time_width;
        }
        if word.has_galactic_pointing() {
            len += AxisAngles::NUM_VALUES * self.binary_width;
        }
        if word.has_detector_rotation() {
            len += AxisVectors::NUM_VALUES * self.binary_width;
        }
        if word.has_horizon_pointing() {
            len += AxisAngles::NUM_VALUES * self.binary_width;
        }
        len
    }

    /// Bytes of one section entry.
    #[inline]
    pub fn sub_record_len(&self) -> usize {
        self.origin_id_width + self.binary_width
    }

    /// Bytes of a section with `count` entries; 0 when the section is disabled.
    pub fn section_len(&self, kind: SubRecordKind, count: usize) -> usize {
        if !self.word.has_section(kind) {
            return 0;
        }
        let entries = count * self.sub_record_len();
        if self.is_single_entry(kind) {
            entries
        } else {
            SECTION_COUNT_BYTES + entries
        }
    }

    /// Bytes of a record given its per-section counts.
    pub fn record_len_for_counts(&self, counts: &[usize; SubRecordKind::COUNT]) -> usize {
        self.fixed_len()
            + self
                .sections()
                .map(|kind| self.section_len(kind, counts[kind.index()]))
                .sum::<usize>()
    }

    /// Bytes `record` occupies when encoded under this layout.
    pub fn record_len(&self, record: &EventRecord) -> usize {
        self.record_len_for_counts(&record.section_counts())
    }
}
