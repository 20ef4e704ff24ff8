//! Performance benchmarks for ispcheck components.
//!
//! These benchmarks measure address extraction from free text and subnet
//! filtering so large pasted lists stay fast to process.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use ispcheck::address::Address;
use ispcheck::extract;
use ispcheck::subnet::NetworkSpec;

/// Free text with `n` addresses mixed with noise and invalid tokens.
fn generate_text(n: usize) -> String {
    let mut text = String::with_capacity(n * 32);
    for i in 0..n {
        let a = (i / 256) % 256;
        let b = i % 256;
        text.push_str(&format!("host-{i} 10.{a}.{b}.7, bogus 999.{b}.1.1; "));
    }
    text
}

fn bench_text_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_extraction");

    for size in [10usize, 1_000, 10_000] {
        let text = generate_text(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| extract::extract_from_text(black_box(text), 8))
        });
    }

    group.finish();
}

fn bench_subnet_filter(c: &mut Criterion) {
    let spec = NetworkSpec::new(
        Address::parse("10.0.0.0").unwrap(),
        Address::parse_mask("255.255.0.0", 8).unwrap(),
    )
    .unwrap();
    let candidates = extract::extract_from_text(&generate_text(10_000), 8);

    let mut group = c.benchmark_group("subnet_filter");
    group.throughput(Throughput::Elements(candidates.len() as u64));
    group.bench_function("contains_10k", |b| {
        b.iter(|| {
            candidates
                .iter()
                .filter(|a| spec.contains(black_box(a)).unwrap_or(false))
                .count()
        })
    });
    group.finish();
}

fn bench_address_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("address_parse");
    group.bench_function("host", |b| b.iter(|| Address::parse(black_box("192.168.100.254"))));
    group.bench_function("mask", |b| {
        b.iter(|| Address::parse_mask(black_box("255.255.240.0"), 8))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_text_extraction,
    bench_subnet_filter,
    bench_address_parse
);
criterion_main!(benches);
