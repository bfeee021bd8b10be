//! Stream reader: one forward pass over header and records.
//!
//! The option word is read exactly once, when the reader is built, and sizes
//! every field that follows. A stream that ends between records is finished;
//! a stream that ends inside a record is a [`FormatError::Truncated`]. The
//! first error ends the stream, there is no resynchronization.

use crate::config::StreamConfig;
use crate::endian::Endianness;
use crate::error::{FormatError, Result, SimBinError};
use crate::layout::RecordLayout;
use crate::option_word::{OptionWord, TimePrecision, OPTION_WORD_BYTES};
use crate::record::{AxisAngles, AxisVectors, EventRecord, SimTime, SubRecord};
use std::io::{self, Read};
use tracing::{debug, trace};

/// Upper bound on entries preallocated per section; counts come from the
/// stream and are not trusted for allocation.
const MAX_PREALLOCATED_ENTRIES: usize = 1024;

/// Reads one binary event stream from a source.
///
/// # Examples
///
/// ```
/// use simbin::StreamReader;
///
/// // header 0, then event IDs 7 and 8 at 32 bit
/// let bytes = [0u8, 0, 0, 0, 7, 0, 0, 0, 8, 0, 0, 0];
/// let mut reader = StreamReader::new(&bytes[..]).unwrap();
///
/// assert_eq!(reader.next_record().unwrap().unwrap().id, 7);
/// assert_eq!(reader.next_record().unwrap().unwrap().id, 8);
/// assert!(reader.next_record().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct StreamReader<R: Read> {
    source: R,
    layout: RecordLayout,
    order: Endianness,
    records_read: usize,
    done: bool,
}

impl<R: Read> StreamReader<R> {
    /// Little-endian reader; reads the header immediately.
    pub fn new(source: R) -> Result<Self> {
        Self::with_order(source, Endianness::Little)
    }

    /// Reader with an explicit byte order; reads the header immediately.
    pub fn with_order(mut source: R, order: Endianness) -> Result<Self> {
        let mut header = [0u8; OPTION_WORD_BYTES];
        let available = read_up_to(&mut source, &mut header)?;
        if available < OPTION_WORD_BYTES {
            return Err(FormatError::HeaderUnreadable { available }.into());
        }

        let word = OptionWord::from_raw(order.decode_uint(&header) as u32);
        let layout = RecordLayout::new(word)?;
        debug!(option_word = %word, ?order, "read stream header");

        Ok(Self {
            source,
            layout,
            order,
            records_read: 0,
            done: false,
        })
    }

    /// Reader using the byte order of a [`StreamConfig`].
    ///
    /// The option word always comes from the stream header; the one in
    /// `config` is ignored.
    pub fn with_config(source: R, config: &StreamConfig) -> Result<Self> {
        Self::with_order(source, config.byte_order)
    }

    /// The governing option word from the header.
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

    /// Records fully decoded so far.
    #[inline]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    /// Decode the next record.
    ///
    /// `Ok(None)` at a clean end of stream, and after any error.
    pub fn next_record(&mut self) -> Result<Option<EventRecord>> {
        if self.done {
            return Ok(None);
        }
        match self.decode_record() {
            Ok(Some(record)) => {
                self.records_read += 1;
                Ok(Some(record))
            }
            Ok(None) => {
                self.done = true;
                debug!(records = self.records_read, "reached end of stream");
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    /// Iterate over the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    /// Decode every remaining record, failing on the first error.
    pub fn read_all(&mut self) -> Result<Vec<EventRecord>> {
        self.records().collect()
    }

    fn decode_record(&mut self) -> Result<Option<EventRecord>> {
        let index = self.records_read;
        let layout = &self.layout;
        let word = layout.option_word();

        let id_width = layout.event_id_width();
        let mut id_buf = [0u8; 8];
        let got = read_up_to(&mut self.source, &mut id_buf[..id_width])?;
        if got == 0 {
            return Ok(None);
        }
        if got < id_width {
            return Err(FormatError::Truncated {
                record: index,
                field: "event id",
            }
            .into());
        }

        let mut fields = FieldReader {
            source: &mut self.source,
            order: self.order,
            record: index,
            consumed: id_width,
        };
        let mut record = EventRecord::new(self.order.decode_uint(&id_buf[..id_width]));

        if word.has_veto() {
            record.veto = fields.flag("veto")?;
        }
        if word.has_bad_flags() {
            record.bad_flags = fields.byte("bad flags")?;
        }
        if word.has_time() {
            record.time = match word.time_precision() {
                TimePrecision::Bits64 => SimTime::from_nanos(fields.u64("time")?),
                TimePrecision::Bits96 => {
                    let seconds = fields.i64("time")?;
                    let nanoseconds = fields.i32("time")?;
                    SimTime::new(seconds, nanoseconds)
                }
            };
        }

        let bw = layout.binary_width();
        if word.has_galactic_pointing() {
            let mut values = [0.0; AxisAngles::NUM_VALUES];
            for value in values.iter_mut() {
                *value = fields.binary(bw, "galactic pointing")?;
            }
            record.galactic_pointing = AxisAngles::from_values(values);
        }
        if word.has_detector_rotation() {
            let mut values = [0.0; AxisVectors::NUM_VALUES];
            for value in values.iter_mut() {
                *value = fields.binary(bw, "detector rotation")?;
            }
            record.detector_rotation = AxisVectors::from_values(values);
        }
        if word.has_horizon_pointing() {
            let mut values = [0.0; AxisAngles::NUM_VALUES];
            for value in values.iter_mut() {
                *value = fields.binary(bw, "horizon pointing")?;
            }
            record.horizon_pointing = AxisAngles::from_values(values);
        }

        for kind in layout.sections() {
            let count = if layout.is_single_entry(kind) {
                1
            } else {
                fields.u32("section count")? as usize
            };

            let entries = record.section_mut(kind);
            entries.reserve(count.min(MAX_PREALLOCATED_ENTRIES));
            for _ in 0..count {
                let origin_id = fields.uint(layout.origin_id_width(), "origin id")? as u32;
                let value = fields.binary(bw, "value")?;
                entries.push(SubRecord { origin_id, value });
            }
        }

        // bytes taken from the source must match the length the header implies
        let expected = layout.record_len(&record);
        if fields.consumed != expected {
            return Err(FormatError::LengthMismatch {
                record: index,
                expected,
                actual: fields.consumed,
            }
            .into());
        }

        trace!(record = index, id = record.id, bytes = expected, "read record");
        Ok(Some(record))
    }
}

/// Iterator over the records of a [`StreamReader`].
///
/// Yields each error once, then stops.
pub struct Records<'a, R: Read> {
    reader: &'a mut StreamReader<R>,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record().transpose()
    }
}

/// Decode a complete in-memory stream.
///
/// Returns the header option word and every record.
pub fn decode_stream(bytes: &[u8], order: Endianness) -> Result<(OptionWord, Vec<EventRecord>)> {
    let mut reader = StreamReader::with_order(bytes, order)?;
    let records = reader.read_all()?;
    Ok((reader.option_word(), records))
}

// =============================================================================
// Field Access
// =============================================================================

/// Fill `buf` as far as the source allows; returns the bytes read.
fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// End of stream inside a record is a format error; anything else is I/O.
fn classify(err: io::Error, record: usize, field: &'static str) -> SimBinError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FormatError::Truncated { record, field }.into()
    } else {
        err.into()
    }
}

/// Reads the fields of one record.
///
/// Every byte pulled from the source passes through the [`Read`] impl below
/// and is counted there, so `consumed` reflects the source position rather
/// than the widths the field helpers asked for.
struct FieldReader<'a, R: Read> {
    source: &'a mut R,
    order: Endianness,
    record: usize,
    consumed: usize,
}

impl<R: Read> Read for FieldReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read(buf)?;
        self.consumed += n;
        Ok(n)
    }
}

impl<R: Read> FieldReader<'_, R> {
    fn byte(&mut self, field: &'static str) -> Result<u8> {
        let mut buf = [0u8; 1];
        let record = self.record;
        self.read_exact(&mut buf)
            .map_err(|e| classify(e, record, field))?;
        Ok(buf[0])
    }

    fn flag(&mut self, field: &'static str) -> Result<bool> {
        match self.byte(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(FormatError::InvalidFlag {
                record: self.record,
                field,
                value,
            }
            .into()),
        }
    }

    fn uint(&mut self, nbytes: usize, field: &'static str) -> Result<u64> {
        let (order, record) = (self.order, self.record);
        order
            .read_uint(self, nbytes)
            .map_err(|e| classify(e, record, field))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32> {
        let (order, record) = (self.order, self.record);
        order.read_u32(self).map_err(|e| classify(e, record, field))
    }

    fn u64(&mut self, field: &'static str) -> Result<u64> {
        let (order, record) = (self.order, self.record);
        order.read_u64(self).map_err(|e| classify(e, record, field))
    }

    fn i32(&mut self, field: &'static str) -> Result<i32> {
        let (order, record) = (self.order, self.record);
        order.read_i32(self).map_err(|e| classify(e, record, field))
    }

    fn i64(&mut self, field: &'static str) -> Result<i64> {
        let (order, record) = (self.order, self.record);
        order.read_i64(self).map_err(|e| classify(e, record, field))
    }

    /// A generic binary value at 4 (f32) or 8 (f64) bytes.
    fn binary(&mut self, width: usize, field: &'static str) -> Result<f64> {
        let (order, record) = (self.order, self.record);
        let read = if width == 8 {
            order.read_f64(self)
        } else {
            order.read_f32(self).map(f64::from)
        };
        read.map_err(|e| classify(e, record, field))
    }
}
