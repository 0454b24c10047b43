//! Throughput of the order-preserving tuple codec across value types and
//! tuple widths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hoply::codec::{decode_tuple, encode_tuple};
use hoply::value::{Tuple, Value};

fn sample_tuple(width: usize) -> Tuple {
    let values = (0..width)
        .map(|i| match i % 4 {
            0 => Value::from(i as i64),
            1 => Value::Text(format!("column-{i}")),
            2 => Value::Float(i as f64 / 3.0),
            _ => Value::from(i % 2 == 0),
        })
        .collect();
    Tuple::new(values)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_tuple");
    for width in [1usize, 4, 8, 16] {
        let tuple = sample_tuple(width);
        group.bench_with_input(BenchmarkId::from_parameter(width), &tuple, |b, tuple| {
            b.iter(|| encode_tuple(tuple));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_tuple");
    for width in [1usize, 4, 8, 16] {
        let tuple = sample_tuple(width);
        let encoded = encode_tuple(&tuple);
        group.bench_with_input(BenchmarkId::from_parameter(width), &encoded, |b, encoded| {
            b.iter(|| decode_tuple(encoded, width).unwrap());
        });
    }
    group.finish();
}

fn bench_round_trip_by_value_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip_by_value_type");
    let cases: Vec<(&str, Tuple)> = vec![
        ("int", Tuple::new(vec![Value::from(123_456_789i64)])),
        ("text_short", Tuple::new(vec![Value::Text("hyperdev.fr".into())])),
        ("text_long", Tuple::new(vec![Value::Text("x".repeat(256))])),
        ("float", Tuple::new(vec![Value::Float(3.14159)])),
        ("bytes", Tuple::new(vec![Value::Bytes(vec![0u8, 1, 2, 255, 0, 254])])),
    ];
    for (label, tuple) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(label), &tuple, |b, tuple| {
            b.iter(|| {
                let encoded = encode_tuple(tuple);
                decode_tuple(&encoded, tuple.arity()).unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_round_trip_by_value_type);
criterion_main!(benches);
