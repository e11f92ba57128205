// ABOUTME: Benchmarks MessagePack decoding against serde_json parsing the same value tree.
// ABOUTME: Covers flat records, integer arrays, nested records and chunked incremental input.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use msgpack_value::{decode, decode_chunks, encode_value, msgpack, DecodeOptions, Value};

fn create_record(i: u32) -> Value {
    msgpack!({
        "id" => i,
        "name" => (format!("User {i}")),
        "email" => (format!("user{i}@example.com")),
        "scores" => [95, 87, 92, 88, 91],
        "active" => true,
        "rating" => (f64::from(i) / 10.0)
    })
}

fn create_array_data() -> Value {
    (0..1000).map(|i: i32| i * 7 - 3000).collect()
}

fn create_nested_data() -> Value {
    (0..100).map(create_record).collect()
}

fn bench_value(c: &mut Criterion, name: &str, value: &Value) {
    let msgpack_bytes = encode_value(value).unwrap();
    let json_bytes = serde_json::to_vec(value).unwrap();

    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Bytes(msgpack_bytes.len() as u64));

    group.bench_function("msgpack_encode", |b| {
        b.iter(|| encode_value(black_box(value)).unwrap())
    });

    group.bench_function("msgpack_decode", |b| {
        b.iter(|| decode(black_box(&msgpack_bytes)).unwrap())
    });

    group.bench_function("json_decode", |b| {
        b.iter(|| {
            let decoded: Value = serde_json::from_slice(black_box(&json_bytes)).unwrap();
            decoded
        })
    });

    println!(
        "{name} sizes: MessagePack={} bytes, JSON={} bytes",
        msgpack_bytes.len(),
        json_bytes.len()
    );

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    bench_value(c, "record", &create_record(42));
}

fn bench_integer_array(c: &mut Criterion) {
    bench_value(c, "integer_array_1000", &create_array_data());
}

fn bench_nested_data(c: &mut Criterion) {
    bench_value(c, "nested_100_records", &create_nested_data());
}

fn bench_chunked(c: &mut Criterion) {
    let bytes = encode_value(&create_nested_data()).unwrap();
    let options = DecodeOptions::default();

    let mut group = c.benchmark_group("chunked_nested_100_records");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    for chunk_size in [16, 256, 4096] {
        group.bench_function(format!("chunks_of_{chunk_size}"), |b| {
            b.iter(|| decode_chunks(black_box(bytes.chunks(chunk_size)), &options).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_record,
    bench_integer_array,
    bench_nested_data,
    bench_chunked
);
criterion_main!(benches);
