//! Performance benchmarks for WireCodec.
//!
//! The scanner link is low-rate (one device, human-paced scans), so these
//! exist to catch regressions rather than to chase throughput numbers.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

use presencia_core::{TemplateId, UserId};
use presencia_protocol::{DeviceCommand, WireCodec};

fn create_command() -> DeviceCommand {
    DeviceCommand::VerifyAttendance {
        uid: UserId::new("u-123456").unwrap(),
        name: "Ada Lovelace".to_string(),
        template_id: TemplateId::new("7").unwrap(),
    }
}

/// Benchmark encoding a verification command.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    let cmd = create_command();

    group.bench_function("encode_verify_command", |b| {
        b.iter(|| {
            let mut codec = WireCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(&cmd), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark decoding a single frame.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    let mut codec = WireCodec::new();
    let mut encoded = BytesMut::new();
    codec.encode(create_command(), &mut encoded).unwrap();
    let encoded_bytes = encoded.freeze();

    group.bench_function("decode_single_frame", |b| {
        b.iter(|| {
            let mut codec = WireCodec::new();
            let mut buffer = BytesMut::from(&encoded_bytes[..]);
            let result = codec.decode(&mut buffer).unwrap();
            black_box(result);
        });
    });

    group.finish();
}

/// Benchmark roundtrip encoding and decoding.
fn bench_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    group.throughput(Throughput::Elements(1));

    let cmd = create_command();

    group.bench_function("roundtrip_verify_command", |b| {
        b.iter(|| {
            let mut encoder = WireCodec::new();
            let mut decoder = WireCodec::new();
            let mut buffer = BytesMut::new();

            encoder.encode(black_box(&cmd), &mut buffer).unwrap();
            let result = decoder.decode(&mut buffer).unwrap();
            black_box(result);
        });
    });

    group.finish();
}

/// Benchmark decoding batches of frames from one buffer.
fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));

        let mut codec = WireCodec::new();
        let mut encoded = BytesMut::new();
        for _ in 0..*batch_size {
            codec.encode(create_command(), &mut encoded).unwrap();
        }
        let encoded_bytes = encoded.freeze();

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, _| {
                b.iter(|| {
                    let mut codec = WireCodec::new();
                    let mut buffer = BytesMut::from(&encoded_bytes[..]);
                    let mut count = 0;

                    while let Ok(Some(_)) = codec.decode(&mut buffer) {
                        count += 1;
                    }

                    black_box(count);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_roundtrip,
    bench_decode_batch,
);

criterion_main!(benches);
