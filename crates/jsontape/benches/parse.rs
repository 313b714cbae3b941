#![allow(missing_docs)]
//! Benchmark – tape and on-demand parsing over a coordinates workload.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsontape::{minify, PaddedString, Parser};

fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

/// A deterministic `{"coordinates":[{"x":..,"y":..,"z":..},..]}` document
/// with `n` points, the shape most coordinate-extraction benchmarks use.
fn make_coordinates(n: usize) -> String {
    let mut state = 0x5DEE_CE66_D1CE_5EED;
    let mut out = String::with_capacity(n * 64);
    out.push_str("{\"coordinates\":[");
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        let f = |state: &mut u64| (xorshift(state) >> 11) as f64 / (1u64 << 53) as f64;
        out.push_str(&format!(
            "{{\"x\":{:?},\"y\":{:?},\"z\":{:?}}}",
            f(&mut state),
            f(&mut state),
            f(&mut state)
        ));
    }
    out.push_str("]}");
    out
}

fn bench_tape_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("tape_parse");
    for &points in &[1_000usize, 10_000] {
        let json = PaddedString::from(make_coordinates(points));
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), &json, |b, json| {
            let mut parser = Parser::new();
            b.iter(|| {
                let doc = parser.parse(json).unwrap();
                black_box(doc.root().element_type());
            });
        });
    }
    group.finish();
}

fn bench_ondemand_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("ondemand_sum");
    for &points in &[1_000usize, 10_000] {
        let json = PaddedString::from(make_coordinates(points));
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(points), &json, |b, json| {
            let mut parser = Parser::new();
            b.iter(|| {
                let mut doc = parser.iterate(json).unwrap();
                let mut root = doc.get_object().unwrap();
                let mut array = root.find_field("coordinates").unwrap().get_array().unwrap();
                let mut sum = 0.0f64;
                while let Some(point) = array.next().unwrap() {
                    let mut point = point.get_object().unwrap();
                    sum += point.find_field("x").unwrap().get_f64().unwrap();
                    sum += point.find_field("y").unwrap().get_f64().unwrap();
                    sum += point.find_field("z").unwrap().get_f64().unwrap();
                }
                black_box(sum);
            });
        });
    }
    group.finish();
}

fn bench_minify(c: &mut Criterion) {
    let pretty = make_coordinates(10_000).replace(',', ", ").replace(':', ": ");
    let mut group = c.benchmark_group("minify");
    group.throughput(Throughput::Bytes(pretty.len() as u64));
    group.bench_function("coordinates", |b| {
        b.iter(|| black_box(minify(pretty.as_bytes()).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_tape_parse, bench_ondemand_sum, bench_minify);
criterion_main!(benches);
