//! Stream writer: option-word header followed by packed event records.
//!
//! Every record is checked against the governing option word before its
//! first byte is emitted, so a value that does not fit its configured width
//! is rejected instead of truncated. The one accepted loss is precision:
//! at 32-bit binary width values are rounded to the nearest `f32`, but a
//! finite value beyond the `f32` range is an error rather than infinity.
//!
//! I/O errors abort the current record; bytes already handed to the sink
//! stay there. Callers that need all-or-nothing records can
//! [`encode_record`](StreamWriter::encode_record) into a buffer first.

use crate::config::StreamConfig;
use crate::endian::Endianness;
use crate::error::{Result, SimBinError};
use crate::layout::RecordLayout;
use crate::option_word::{OptionWord, TimePrecision};
use crate::record::{EventRecord, SubRecordKind};
use std::io::Write;
use tracing::{debug, trace};

/// Writes one binary event stream to a sink.
///
/// # Examples
///
/// ```
/// use simbin::{EventRecord, OptionWord, StreamWriter};
///
/// let mut word = OptionWord::new();
/// word.set_has_veto(true);
///
/// let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
/// let mut record = EventRecord::new(42);
/// record.veto = true;
/// writer.write_record(&record).unwrap();
///
/// let bytes = writer.finish().unwrap();
/// assert_eq!(bytes, [0x40, 0, 0, 0, 42, 0, 0, 0, 1]);
/// ```
#[derive(Debug)]
pub struct StreamWriter<W: Write> {
    sink: W,
    layout: RecordLayout,
    order: Endianness,
    records_written: usize,
    bytes_written: u64,
}

impl<W: Write> StreamWriter<W> {
    /// Little-endian writer; emits the header immediately.
    pub fn new(sink: W, word: OptionWord) -> Result<Self> {
        Self::with_order(sink, word, Endianness::Little)
    }

    /// Writer with an explicit byte order; emits the header immediately.
    pub fn with_order(mut sink: W, word: OptionWord, order: Endianness) -> Result<Self> {
        let layout = RecordLayout::new(word)?;
        order.write_u32(&mut sink, word.to_raw())?;
        debug!(option_word = %word, ?order, "wrote stream header");

        Ok(Self {
            sink,
            layout,
            order,
            records_written: 0,
            bytes_written: crate::option_word::OPTION_WORD_BYTES as u64,
        })
    }

    /// Writer configured from a [`StreamConfig`].
    pub fn with_config(sink: W, config: &StreamConfig) -> Result<Self> {
        Self::with_order(sink, config.option_word, config.byte_order)
    }

    #[inline]
    pub fn option_word(&self) -> OptionWord {
        self.layout.option_word()
    }

    #[inline]
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    #[inline]
    pub fn byte_order(&self) -> Endianness {
        self.order
    }

    /// Records fully written so far.
    #[inline]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Bytes written so far, header included.
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Validate and write one record straight to the sink.
    pub fn write_record(&mut self, record: &EventRecord) -> Result<()> {
        let index = self.records_written;
        validate(&self.layout, record, index)?;
        encode(&mut self.sink, &self.layout, self.order, record)?;

        let len = self.layout.record_len(record);
        trace!(record = index, id = record.id, bytes = len, "wrote record");
        self.records_written += 1;
        self.bytes_written += len as u64;
        Ok(())
    }

    /// Write records in order, stopping at the first failure.
    ///
    /// Returns the number of records written by this call.
    pub fn write_all<'a, I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut count = 0;
        for record in records {
            self.write_record(record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Encode a record into a fresh buffer without touching the sink.
    ///
    /// The record is validated as if it were the next one written.
    pub fn encode_record(&self, record: &EventRecord) -> Result<Vec<u8>> {
        validate(&self.layout, record, self.records_written)?;
        let mut buf = Vec::with_capacity(self.layout.record_len(record));
        encode(&mut buf, &self.layout, self.order, record)?;
        Ok(buf)
    }

    /// Flush the sink and hand it back.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        debug!(
            records = self.records_written,
            bytes = self.bytes_written,
            "finished stream"
        );
        Ok(self.sink)
    }
}

/// Encode a complete stream (header and records) into memory.
///
/// # Examples
///
/// ```
/// use simbin::{decode_stream, encode_stream, Endianness, EventRecord, OptionWord};
///
/// let records = vec![EventRecord::new(1), EventRecord::new(2)];
/// let bytes = encode_stream(OptionWord::new(), &records, Endianness::Little).unwrap();
/// assert_eq!(bytes.len(), 4 + 2 * 4);
///
/// let (word, decoded) = decode_stream(&bytes, Endianness::Little).unwrap();
/// assert_eq!(word, OptionWord::new());
/// assert_eq!(decoded, records);
/// ```
pub fn encode_stream(
    word: OptionWord,
    records: &[EventRecord],
    order: Endianness,
) -> Result<Vec<u8>> {
    let layout = RecordLayout::new(word)?;
    let capacity = crate::option_word::OPTION_WORD_BYTES
        + records.iter().map(|r| layout.record_len(r)).sum::<usize>();

    let mut writer = StreamWriter::with_order(Vec::with_capacity(capacity), word, order)?;
    writer.write_all(records)?;
    writer.finish()
}

// =============================================================================
// Validation
// =============================================================================

fn out_of_range(record: usize, field: &'static str, value: i128, width: usize) -> SimBinError {
    SimBinError::ValueOutOfRange {
        record,
        field,
        value,
        width,
    }
}

fn max_for_width(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// Check that every field the layout writes fits its width.
fn validate(layout: &RecordLayout, record: &EventRecord, index: usize) -> Result<()> {
    let word = layout.option_word();

    let id_width = layout.event_id_width();
    if record.id > max_for_width(id_width) {
        return Err(out_of_range(index, "event id", record.id.into(), id_width));
    }

    if word.has_time()
        && word.time_precision() == TimePrecision::Bits64
        && record.time.as_nanos().is_none()
    {
        return Err(out_of_range(
            index,
            "time",
            i128::from(record.time.seconds),
            layout.time_width(),
        ));
    }

    let origin_width = layout.origin_id_width();
    let origin_max = max_for_width(origin_width);
    for kind in layout.sections() {
        let entries = record.section(kind);
        if layout.is_single_entry(kind) {
            if entries.len() != 1 {
                return Err(SimBinError::InvalidRecord {
                    record: index,
                    reason: format!(
                        "single init mode needs exactly one {} entry, found {}",
                        kind,
                        entries.len()
                    ),
                });
            }
        } else if u32::try_from(entries.len()).is_err() {
            return Err(out_of_range(
                index,
                "section count",
                entries.len() as i128,
                crate::layout::SECTION_COUNT_BYTES,
            ));
        }

        if let Some(sub) = entries
            .iter()
            .find(|sub| u64::from(sub.origin_id) > origin_max)
        {
            return Err(out_of_range(
                index,
                "origin id",
                sub.origin_id.into(),
                origin_width,
            ));
        }
        check_floats(layout, index, "value", entries.iter().map(|sub| sub.value))?;
    }

    if word.has_galactic_pointing() {
        let values = record.galactic_pointing.values();
        check_floats(layout, index, "galactic pointing", values)?;
    }
    if word.has_detector_rotation() {
        let values = record.detector_rotation.values();
        check_floats(layout, index, "detector rotation", values)?;
    }
    if word.has_horizon_pointing() {
        let values = record.horizon_pointing.values();
        check_floats(layout, index, "horizon pointing", values)?;
    }

    Ok(())
}

/// At 32-bit binary width, reject finite values that would become infinite.
fn check_floats<I>(
    layout: &RecordLayout,
    index: usize,
    field: &'static str,
    values: I,
) -> Result<()>
where
    I: IntoIterator<Item = f64>,
{
    if layout.binary_width() == 8 {
        return Ok(());
    }
    match values
        .into_iter()
        .find(|v| v.is_finite() && !(*v as f32).is_finite())
    {
        Some(value) => Err(SimBinError::FloatOutOfRange {
            record: index,
            field,
            value,
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Encoding
// =============================================================================

fn write_binary<S: Write + ?Sized>(
    sink: &mut S,
    order: Endianness,
    width: usize,
    value: f64,
) -> Result<()> {
    if width == 8 {
        order.write_f64(sink, value)?;
    } else {
        order.write_f32(sink, value as f32)?;
    }
    Ok(())
}

/// Emit one validated record.
fn encode<S: Write + ?Sized>(
    sink: &mut S,
    layout: &RecordLayout,
    order: Endianness,
    record: &EventRecord,
) -> Result<()> {
    let word = layout.option_word();
    let bw = layout.binary_width();

    order.write_uint(sink, record.id, layout.event_id_width())?;

    if word.has_veto() {
        sink.write_all(&[u8::from(record.veto)])?;
    }
    if word.has_bad_flags() {
        sink.write_all(&[record.bad_flags])?;
    }
    if word.has_time() {
        match word.time_precision() {
            TimePrecision::Bits64 => {
                // validated above
                let nanos = record.time.as_nanos().unwrap_or_default();
                order.write_u64(sink, nanos)?;
            }
            TimePrecision::Bits96 => {
                order.write_i64(sink, record.time.seconds)?;
                order.write_i32(sink, record.time.nanoseconds)?;
            }
        }
    }
    if word.has_galactic_pointing() {
        for value in record.galactic_pointing.values() {
            write_binary(sink, order, bw, value)?;
        }
    }
    if word.has_detector_rotation() {
        for value in record.detector_rotation.values() {
            write_binary(sink, order, bw, value)?;
        }
    }
    if word.has_horizon_pointing() {
        for value in record.horizon_pointing.values() {
            write_binary(sink, order, bw, value)?;
        }
    }

    for kind in layout.sections() {
        write_section(sink, layout, order, record, kind)?;
    }
    Ok(())
}

fn write_section<S: Write + ?Sized>(
    sink: &mut S,
    layout: &RecordLayout,
    order: Endianness,
    record: &EventRecord,
    kind: SubRecordKind,
) -> Result<()> {
    let entries = record.section(kind);
    if !layout.is_single_entry(kind) {
        order.write_u32(sink, entries.len() as u32)?;
    }
    for sub in entries {
        order.write_uint(sink, u64::from(sub.origin_id), layout.origin_id_width())?;
        write_binary(sink, order, layout.binary_width(), sub.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option_word::{OriginIdPrecision, WordPrecision};
    use crate::record::{SimTime, SubRecord};

    #[test]
    fn test_header_only() {
        let writer = StreamWriter::new(Vec::new(), OptionWord::from_raw(0xA5)).unwrap();
        assert_eq!(writer.bytes_written(), 4);
        assert_eq!(writer.finish().unwrap(), [0xA5, 0, 0, 0]);
    }

    #[test]
    fn test_big_endian_header() {
        let writer =
            StreamWriter::with_order(Vec::new(), OptionWord::from_raw(0xA5), Endianness::Big)
                .unwrap();
        assert_eq!(writer.finish().unwrap(), [0, 0, 0, 0xA5]);
    }

    #[test]
    fn test_record_bytes() {
        let mut word = OptionWord::new();
        word.set_has_hit_records(true);

        let record = EventRecord::new(42)
            .with_sub_record(SubRecordKind::Hit, SubRecord::new(3, 1000.0));

        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        let encoded = writer.encode_record(&record).unwrap();
        writer.write_record(&record).unwrap();
        let bytes = writer.finish().unwrap();

        let mut expected = vec![0x00, 0x08, 0x00, 0x00];
        expected.extend_from_slice(&42u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.push(3);
        expected.extend_from_slice(&1000.0f32.to_le_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(&bytes[4..], encoded.as_slice());
    }

    #[test]
    fn test_event_id_out_of_range() {
        let mut writer = StreamWriter::new(Vec::new(), OptionWord::new()).unwrap();
        let err = writer
            .write_record(&EventRecord::new(u64::from(u32::MAX) + 1))
            .unwrap_err();
        assert!(matches!(
            err,
            SimBinError::ValueOutOfRange {
                record: 0,
                field: "event id",
                width: 4,
                ..
            }
        ));
        // nothing past the header
        assert_eq!(writer.finish().unwrap().len(), 4);
    }

    #[test]
    fn test_origin_id_out_of_range() {
        let mut word = OptionWord::new();
        word.set_origin_id_precision(OriginIdPrecision::Bits16);
        word.set_has_drift_records(true);

        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        writer.write_record(&EventRecord::new(0)).unwrap();

        let record = EventRecord::new(1)
            .with_sub_record(SubRecordKind::Drift, SubRecord::new(70_000, 0.0));
        let err = writer.write_record(&record).unwrap_err();
        assert_eq!(err.record_index(), Some(1));
        assert_eq!(writer.records_written(), 1);
    }

    #[test]
    fn test_negative_time_needs_96_bits() {
        let mut word = OptionWord::new();
        word.set_has_time(true);
        let mut record = EventRecord::new(5);
        record.time = SimTime::new(-3, 0);

        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        assert!(writer.write_record(&record).is_err());

        word.set_time_precision(TimePrecision::Bits96);
        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        writer.write_record(&record).unwrap();
        assert_eq!(writer.bytes_written(), 4 + 4 + 12);
    }

    #[test]
    fn test_single_init_requires_one_entry() {
        let mut word = OptionWord::new();
        word.set_has_interaction_records(true);
        word.set_has_only_single_init_record(true);

        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        let err = writer.write_record(&EventRecord::new(1)).unwrap_err();
        assert!(matches!(err, SimBinError::InvalidRecord { record: 0, .. }));

        let record = EventRecord::new(1)
            .with_sub_record(SubRecordKind::Interaction, SubRecord::new(1, 511.0));
        writer.write_record(&record).unwrap();
        assert_eq!(writer.bytes_written(), 4 + 4 + 1 + 4);
    }

    #[test]
    fn test_disabled_fields_are_skipped() {
        let mut record = EventRecord::new(7)
            .with_sub_record(SubRecordKind::Group, SubRecord::new(1, 1.0));
        record.veto = true;
        record.time = SimTime::new(1, 0);

        let mut word = OptionWord::new();
        word.set_event_id_precision(WordPrecision::Bits64);
        let bytes = encode_stream(word, &[record], Endianness::Little).unwrap();
        assert_eq!(bytes.len(), 4 + 8);
    }

    #[test]
    fn test_f32_overflow_rejected() {
        let mut word = OptionWord::new();
        word.set_has_hit_records(true);

        let mut writer = StreamWriter::new(Vec::new(), word).unwrap();
        let record = EventRecord::new(1)
            .with_sub_record(SubRecordKind::Hit, SubRecord::new(1, 1.0e300));
        let err = writer.write_record(&record).unwrap_err();
        assert!(matches!(
            err,
            SimBinError::FloatOutOfRange {
                record: 0,
                field: "value",
                ..
            }
        ));
        assert_eq!(writer.finish().unwrap().len(), 4);

        // narrowing within range is accepted, as are values already infinite
        let record = EventRecord::new(2)
            .with_sub_record(SubRecordKind::Hit, SubRecord::new(1, 0.1))
            .with_sub_record(SubRecordKind::Hit, SubRecord::new(2, f64::NEG_INFINITY))
            .with_sub_record(SubRecordKind::Hit, SubRecord::new(3, -3.0e38));
        assert!(encode_stream(word, &[record.clone()], Endianness::Little).is_ok());

        word.set_binary_precision(WordPrecision::Bits64);
        let record = record.with_sub_record(SubRecordKind::Hit, SubRecord::new(4, 1.0e300));
        assert!(encode_stream(word, &[record], Endianness::Little).is_ok());
    }

    #[test]
    fn test_f32_overflow_in_pointing_rejected() {
        let mut word = OptionWord::new();
        word.set_has_detector_rotation(true);

        let mut record = EventRecord::new(3);
        record.detector_rotation.z_axis[2] = -1.0e40;
        let err = encode_stream(word, &[record], Endianness::Little).unwrap_err();
        assert!(matches!(
            err,
            SimBinError::FloatOutOfRange {
                field: "detector rotation",
                ..
            }
        ));
    }

    #[test]
    fn test_failing_sink_aborts_record() {
        use std::io;

        /// Accepts `capacity` bytes, then reports a closed pipe.
        struct ClosingSink {
            data: Vec<u8>,
            capacity: usize,
        }

        impl Write for ClosingSink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                let room = self.capacity - self.data.len();
                if room == 0 {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
                }
                let n = room.min(buf.len());
                self.data.extend_from_slice(&buf[..n]);
                Ok(n)
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sink = ClosingSink {
            data: Vec::new(),
            capacity: 6,
        };
        let mut writer = StreamWriter::new(sink, OptionWord::new()).unwrap();
        let err = writer.write_record(&EventRecord::new(5)).unwrap_err();

        assert!(matches!(err, SimBinError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(writer.records_written(), 0);
        assert_eq!(writer.bytes_written(), 4);
        // header and the first half of the event id stay in the sink
        assert_eq!(writer.get_ref().data, [0, 0, 0, 0, 5, 0]);
    }

    #[test]
    fn test_unassigned_origin_code_rejected() {
        let err = StreamWriter::new(Vec::new(), OptionWord::from_raw(0b11 << 3)).unwrap_err();
        assert!(err.is_format());
    }
}
