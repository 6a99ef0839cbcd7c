//! Benchmarks for multi-lookup
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multi_lookup::config::LookupConfig;
use multi_lookup::dns::StaticResolver;
use multi_lookup::pipeline::{BoundedBuffer, LookupRunner};
use multi_lookup::sink::LogSink;
use multi_lookup::source::DomainName;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tempfile::NamedTempFile;

fn benchmark_buffer_operations(c: &mut Criterion) {
    c.bench_function("buffer_push_pop", |b| {
        let mut buffer = BoundedBuffer::new(5);

        b.iter(|| {
            let _ = buffer.push(DomainName::Valid("example.com".to_string()));
            let popped = buffer.pop();
            black_box(popped);
        })
    });
}

fn benchmark_name_classification(c: &mut Criterion) {
    let long = "x".repeat(2048);

    c.bench_function("domain_name_new", |b| {
        b.iter(|| {
            black_box(DomainName::new(black_box("www.example.com".to_string()), 1025));
            black_box(DomainName::new(black_box(long.clone()), 1025));
        })
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    let mut file = NamedTempFile::new().expect("temp file");
    let mut resolver = StaticResolver::new();
    for i in 0..1000u32 {
        let name = format!("host{}.example", i);
        writeln!(file, "{}", name).expect("write data file");
        resolver = resolver.with_entry(name, IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i)));
    }
    file.flush().expect("flush data file");
    let resolver = Arc::new(resolver);

    let mut group = c.benchmark_group("pipeline_1000_names");
    for (requesters, resolvers) in [(1usize, 1usize), (2, 4), (5, 10)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", requesters, resolvers)),
            &(requesters, resolvers),
            |b, &(requesters, resolvers)| {
                b.iter(|| {
                    let config = LookupConfig::new(
                        requesters,
                        resolvers,
                        vec![file.path().to_path_buf()],
                        "unused-requester.log",
                        "unused-resolver.log",
                    );
                    let runner = LookupRunner::with_parts(
                        config,
                        resolver.clone(),
                        LogSink::from_writer(std::io::sink()),
                        LogSink::from_writer(std::io::sink()),
                    );
                    black_box(runner.run().expect("pipeline run"))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_buffer_operations,
    benchmark_name_classification,
    benchmark_pipeline
);
criterion_main!(benches);
