//! Benchmarks for the compile pipeline.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use sc_compiler::{Compiler, CompilerOptions, ContentBlockerConverter, SafariVersion};
use sc_core::parse_rules;

fn sample_list() -> Vec<String> {
    let mut lines = Vec::new();
    for i in 0..2_000 {
        lines.push(format!("##.ad-banner-{i}"));
        lines.push(format!("site{}.com##.sidebar-ad-{i}", i % 50));
        lines.push(format!("||tracker{i}.net^$third-party"));
    }
    for i in 0..200 {
        lines.push(format!("site{i}.com#@#.ad-banner-{i}"));
        lines.push(format!("@@||site{i}.com^$elemhide"));
    }
    lines
}

fn bench_compile(c: &mut Criterion) {
    let rules = parse_rules(sample_list()).rules;
    let compiler = Compiler::new(CompilerOptions::default());

    c.bench_function("compile_rules", |b| b.iter(|| compiler.compile(black_box(&rules))));
}

fn bench_convert(c: &mut Criterion) {
    let lines = sample_list();
    let converter = ContentBlockerConverter::new(SafariVersion::Safari16, CompilerOptions::default());

    c.bench_function("convert_array", |b| {
        b.iter(|| converter.convert_array(black_box(&lines)))
    });
}

criterion_group!(benches, bench_compile, bench_convert);
criterion_main!(benches);
