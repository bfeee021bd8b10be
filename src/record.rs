//! In-memory form of one simulated event.
//!
//! An [`EventRecord`] holds every field the binary format can carry. Which of
//! them actually reach the stream is decided by the governing
//! [`OptionWord`](crate::OptionWord): fields whose flag is clear are neither
//! written nor read, and decode as their `Default`.

use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

// =============================================================================
// Sub-records
// =============================================================================

/// The kinds of sub-record sections an event may carry, in stream order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubRecordKind {
    /// Interactions (IA)
    Interaction,
    /// Hits (HT)
    Hit,
    /// Guard-ring hits (GR)
    Group,
    /// Additional hit-like entries
    Extra,
    /// Origin records
    Origin,
    /// Drift records (DR)
    Drift,
}

impl SubRecordKind {
    /// Number of section kinds.
    pub const COUNT: usize = 6;

    /// All kinds in stream order.
    pub const ALL: [SubRecordKind; SubRecordKind::COUNT] = [
        SubRecordKind::Interaction,
        SubRecordKind::Hit,
        SubRecordKind::Group,
        SubRecordKind::Extra,
        SubRecordKind::Origin,
        SubRecordKind::Drift,
    ];

    /// Position in stream order.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            SubRecordKind::Interaction => "interaction",
            SubRecordKind::Hit => "hit",
            SubRecordKind::Group => "group",
            SubRecordKind::Extra => "extra",
            SubRecordKind::Origin => "origin",
            SubRecordKind::Drift => "drift",
        }
    }
}

impl fmt::Display for SubRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An origin-ID/value pair nested inside an event.
///
/// The origin ID is written with the option word's origin-ID width, the value
/// with its binary width. At 32-bit binary precision the value is narrowed to
/// `f32` on the way out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubRecord {
    pub origin_id: u32,
    pub value: f64,
}

impl SubRecord {
    #[inline]
    pub fn new(origin_id: u32, value: f64) -> Self {
        Self { origin_id, value }
    }
}

// =============================================================================
// Time and Orientation
// =============================================================================

/// Event time as whole seconds plus nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTime {
    pub seconds: i64,
    pub nanoseconds: i32,
}

impl SimTime {
    #[inline]
    pub fn new(seconds: i64, nanoseconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Split a total nanosecond count (the 64-bit stream form).
    pub fn from_nanos(total: u64) -> Self {
        let per_second = NANOS_PER_SECOND as u64;
        Self {
            seconds: (total / per_second) as i64,
            nanoseconds: (total % per_second) as i32,
        }
    }

    /// Total nanoseconds, or `None` when the time is negative, not normalized
    /// or too large for a `u64`.
    pub fn as_nanos(&self) -> Option<u64> {
        if self.seconds < 0
            || self.nanoseconds < 0
            || i64::from(self.nanoseconds) >= NANOS_PER_SECOND
        {
            return None;
        }
        (self.seconds as u64)
            .checked_mul(NANOS_PER_SECOND as u64)?
            .checked_add(self.nanoseconds as u64)
    }
}

/// X and Z axes given as angle pairs, used for galactic (longitude, latitude)
/// and horizon (azimuth, altitude) pointing. Degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisAngles {
    pub x_axis: [f64; 2],
    pub z_axis: [f64; 2],
}

impl AxisAngles {
    /// Binary values occupied in the stream.
    pub const NUM_VALUES: usize = 4;

    pub fn new(x_axis: [f64; 2], z_axis: [f64; 2]) -> Self {
        Self { x_axis, z_axis }
    }

    pub(crate) fn values(&self) -> [f64; Self::NUM_VALUES] {
        [self.x_axis[0], self.x_axis[1], self.z_axis[0], self.z_axis[1]]
    }

    pub(crate) fn from_values(v: [f64; Self::NUM_VALUES]) -> Self {
        Self {
            x_axis: [v[0], v[1]],
            z_axis: [v[2], v[3]],
        }
    }
}

/// Detector rotation as X and Z axis vectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisVectors {
    pub x_axis: [f64; 3],
    pub z_axis: [f64; 3],
}

impl AxisVectors {
    /// Binary values occupied in the stream.
    pub const NUM_VALUES: usize = 6;

    pub fn new(x_axis: [f64; 3], z_axis: [f64; 3]) -> Self {
        Self { x_axis, z_axis }
    }

    pub(crate) fn values(&self) -> [f64; Self::NUM_VALUES] {
        let (x, z) = (self.x_axis, self.z_axis);
        [x[0], x[1], x[2], z[0], z[1], z[2]]
    }

    pub(crate) fn from_values(v: [f64; Self::NUM_VALUES]) -> Self {
        Self {
            x_axis: [v[0], v[1], v[2]],
            z_axis: [v[3], v[4], v[5]],
        }
    }
}

// =============================================================================
// EventRecord
// =============================================================================

/// One simulated event and its sub-record sections.
///
/// # Examples
///
/// ```
/// use simbin::{EventRecord, SubRecord, SubRecordKind};
///
/// let record = EventRecord::new(42)
///     .with_sub_record(SubRecordKind::Hit, SubRecord::new(3, 1000.0))
///     .with_sub_record(SubRecordKind::Hit, SubRecord::new(7, -5.5));
///
/// assert_eq!(record.section(SubRecordKind::Hit).len(), 2);
/// assert_eq!(record.num_sub_records(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub veto: bool,
    pub bad_flags: u8,
    pub time: SimTime,
    pub galactic_pointing: AxisAngles,
    pub detector_rotation: AxisVectors,
    pub horizon_pointing: AxisAngles,
    sections: [Vec<SubRecord>; SubRecordKind::COUNT],
}

impl EventRecord {
    /// An event with the given ID and every other field at its default.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Entries of one section, in stream order.
    #[inline]
    pub fn section(&self, kind: SubRecordKind) -> &[SubRecord] {
        &self.sections[kind.index()]
    }

    #[inline]
    pub fn section_mut(&mut self, kind: SubRecordKind) -> &mut Vec<SubRecord> {
        &mut self.sections[kind.index()]
    }

    /// Append one entry to a section.
    pub fn push(&mut self, kind: SubRecordKind, sub_record: SubRecord) {
        self.sections[kind.index()].push(sub_record);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_sub_record(mut self, kind: SubRecordKind, sub_record: SubRecord) -> Self {
        self.push(kind, sub_record);
        self
    }

    /// Entry count per section, indexed by [`SubRecordKind::index`].
    pub fn section_counts(&self) -> [usize; SubRecordKind::COUNT] {
        let mut counts = [0; SubRecordKind::COUNT];
        for (count, section) in counts.iter_mut().zip(&self.sections) {
            *count = section.len();
        }
        counts
    }

    /// Entries across all sections.
    pub fn num_sub_records(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }
}
