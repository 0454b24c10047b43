//! Throughput of pattern scans and multi-step joins against the
//! in-memory backend, across relation sizes and join depths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hoply::okvs::memory::MemoryDriver;
use hoply::okvs::Driver;
use hoply::query::{compose, seed, where_step};
use hoply::store::{var, Pattern, Slot};
use hoply::value::{Tuple, Value};
use hoply::{Relation, Store};

fn populated_triple_store(driver: &MemoryDriver, rows: usize) -> (Store, Box<dyn hoply::okvs::Transaction + '_>) {
    let store = Store::new(Relation::new("triple", vec!["subject".into(), "predicate".into(), "object".into()]));
    let mut tr = driver.begin().unwrap();
    for i in 0..rows {
        let subject = format!("s{i}");
        let keyword = if i % 7 == 0 { "hacker" } else { "other" };
        store.add(&mut *tr, &Tuple::new(vec![Value::from(subject.as_str()), Value::from("keyword"), Value::from(keyword)])).unwrap();
        store.add(&mut *tr, &Tuple::new(vec![Value::from(subject.as_str()), Value::from("title"), Value::Text(format!("blog-{i}"))])).unwrap();
    }
    (store, tr)
}

fn bench_single_pattern_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_pattern_scan");
    for rows in [100usize, 1_000, 10_000] {
        let driver = MemoryDriver::new();
        let (store, tr) = populated_triple_store(&driver, rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                let pattern = Pattern::new(vec![var("s"), Slot::Bound(Value::from("keyword")), Slot::Bound(Value::from("hacker"))]);
                store.from(&*tr, &pattern, &Default::default()).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_two_step_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_step_join");
    for rows in [100usize, 1_000, 10_000] {
        let driver = MemoryDriver::new();
        let (store, tr) = populated_triple_store(&driver, rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                let keyword_hacker = where_step(&store, &*tr, Pattern::new(vec![var("x"), Slot::Bound(Value::from("keyword")), Slot::Bound(Value::from("hacker"))]));
                let title_of_x = where_step(&store, &*tr, Pattern::new(vec![var("x"), Slot::Bound(Value::from("title")), var("blog")]));
                let pipeline = compose(vec![keyword_hacker, title_of_x]);
                pipeline(seed()).collect::<Result<Vec<_>, _>>().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_pattern_scan, bench_two_step_join);
criterion_main!(benches);
