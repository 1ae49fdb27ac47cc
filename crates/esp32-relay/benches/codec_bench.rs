//! Criterion benchmarks for frame decoding and encoding.
//!
//! Run with: `cargo bench --package esp32-relay --bench codec_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use esp32_relay::application::codec::{decode, encode};
use esp32_relay::domain::OutboundMsg;

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    group.bench_function("position", |b| {
        b.iter(|| decode(black_box(r#"{"row":3,"col":4}"#)))
    });
    group.bench_function("ping", |b| b.iter(|| decode(black_box(r#"{"type":"ping"}"#))));
    group.bench_function("result", |b| b.iter(|| decode(black_box(r#"{"result":true}"#))));
    group.bench_function("malformed", |b| b.iter(|| decode(black_box("{not json"))));

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let status = OutboundMsg::device_status(true);
    let result = OutboundMsg::movement_result(false);

    c.bench_function("encode/esp32_status", |b| b.iter(|| encode(black_box(&status))));
    c.bench_function("encode/movement_result", |b| b.iter(|| encode(black_box(&result))));
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
