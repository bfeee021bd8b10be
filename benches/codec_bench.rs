//! Throughput benchmarks for stream encoding and decoding.
//!
//! Streams are generated from a fixed seed so runs are comparable:
//! - Encoding and decoding of hit-heavy events at both binary precisions
//! - Per-record overhead of the reader on a metadata-only stream

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simbin::{
    decode_stream, encode_stream, Endianness, EventRecord, OptionWord, SimTime, StreamReader,
    SubRecord, SubRecordKind, TimePrecision, WordPrecision,
};

const NUM_RECORDS: usize = 1000;

fn hit_word(binary: WordPrecision) -> OptionWord {
    let mut word = OptionWord::new();
    word.set_binary_precision(binary);
    word.set_has_time(true);
    word.set_has_interaction_records(true);
    word.set_has_hit_records(true);
    word
}

fn hit_stream(hits: usize) -> Vec<EventRecord> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..NUM_RECORDS as u64)
        .map(|id| {
            let mut record = EventRecord::new(id);
            record.time = SimTime::from_nanos(rng.gen_range(0..1_000_000_000_000));
            record.push(SubRecordKind::Interaction, SubRecord::new(1, 1.0));
            for _ in 0..hits {
                let sub = SubRecord::new(rng.gen_range(0..256), f64::from(rng.gen::<f32>()));
                record.push(SubRecordKind::Hit, sub);
            }
            record
        })
        .collect()
}

// =============================================================================
// Encoding
// =============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_stream");

    for hits in [1, 8, 64].iter() {
        for binary in [WordPrecision::Bits32, WordPrecision::Bits64] {
            let word = hit_word(binary);
            let records = hit_stream(*hits);
            let bytes = encode_stream(word, &records, Endianness::Little).unwrap();
            group.throughput(Throughput::Bytes(bytes.len() as u64));

            let id = format!("{:?}/{}", binary, hits);
            group.bench_with_input(BenchmarkId::from_parameter(id), &records, |b, records| {
                b.iter(|| encode_stream(black_box(word), black_box(records), Endianness::Little));
            });
        }
    }

    group.finish();
}

// =============================================================================
// Decoding
// =============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_stream");

    for hits in [1, 8, 64].iter() {
        for binary in [WordPrecision::Bits32, WordPrecision::Bits64] {
            let word = hit_word(binary);
            let bytes = encode_stream(word, &hit_stream(*hits), Endianness::Little).unwrap();
            group.throughput(Throughput::Bytes(bytes.len() as u64));

            let id = format!("{:?}/{}", binary, hits);
            group.bench_with_input(BenchmarkId::from_parameter(id), &bytes, |b, bytes| {
                b.iter(|| decode_stream(black_box(bytes), Endianness::Little));
            });
        }
    }

    group.finish();
}

fn bench_metadata_records(c: &mut Criterion) {
    let mut word = OptionWord::new();
    word.set_event_id_precision(WordPrecision::Bits64);
    word.set_time_precision(TimePrecision::Bits96);
    word.set_has_time(true);
    word.set_has_veto(true);
    word.set_has_galactic_pointing(true);

    let records: Vec<_> = (0..NUM_RECORDS as u64)
        .map(|id| {
            let mut record = EventRecord::new(id);
            record.time = SimTime::new(id as i64, 0);
            record
        })
        .collect();
    let bytes = encode_stream(word, &records, Endianness::Big).unwrap();

    let mut group = c.benchmark_group("metadata_records");
    group.throughput(Throughput::Elements(NUM_RECORDS as u64));
    group.bench_function("next_record", |b| {
        b.iter(|| {
            let mut reader = StreamReader::with_order(black_box(bytes.as_slice()), Endianness::Big)
                .unwrap();
            let mut n = 0;
            while let Ok(Some(_)) = reader.next_record() {
                n += 1;
            }
            n
        });
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_metadata_records);
criterion_main!(benches);
