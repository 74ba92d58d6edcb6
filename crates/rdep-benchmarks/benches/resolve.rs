//! Dependency resolution performance benchmarks
//!
//! Benchmarks index construction, single-root closure queries, batch
//! queries and parallel per-package checking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rdep_benchmarks::{criterion_config, synthetic_repository, RepoShape};
use rdep_core::types::NameAndVersion;
use rdep_resolver::{Index, LowestMatching, Resolver, RevisitPolicy};

/// Benchmark building the index over repositories of different sizes
fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for names in [100, 1_000, 10_000].iter() {
        let repository = synthetic_repository(RepoShape::new(*names));
        group.throughput(Throughput::Elements(repository.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("names", names),
            &repository,
            |b, repository| {
                b.iter(|| black_box(Index::build(repository)));
            },
        );
    }

    group.finish();
}

/// Benchmark one closure query from the top of the layered repository
fn bench_single_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_query");
    group.measurement_time(std::time::Duration::from_secs(5));

    for names in [100, 1_000, 10_000].iter() {
        let repository = synthetic_repository(RepoShape::new(*names));
        let index = Index::build(&repository);
        let root = format!("pkg{}", names - 1);

        for revisit in [RevisitPolicy::Independent, RevisitPolicy::SkipVisited] {
            let resolver = Resolver::new(&index).with_revisit(revisit);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", revisit), names),
                &root,
                |b, root| {
                    b.iter(|| black_box(resolver.unsatisfied(root)));
                },
            );
        }
    }

    group.finish();
}

/// Benchmark a batch query rooted at every name
fn bench_batch_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_query");
    group.sample_size(20);

    let repository = synthetic_repository(RepoShape::new(1_000));
    let index = Index::build(&repository);
    let roots: Vec<NameAndVersion> = index.names().map(NameAndVersion::any).collect();

    group.bench_function("highest", |b| {
        let resolver = Resolver::new(&index);
        b.iter(|| black_box(resolver.unsatisfied_batch(&roots)));
    });

    let lowest = Index::with_policy(&repository, LowestMatching);
    group.bench_function("lowest", |b| {
        let resolver = Resolver::new(&lowest);
        b.iter(|| black_box(resolver.unsatisfied_batch(&roots)));
    });

    group.finish();
}

/// Compare one-by-one queries against the parallel `check_each`
fn bench_check_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_all");
    group.sample_size(10);

    let repository = synthetic_repository(RepoShape::new(1_000));
    let index = Index::build(&repository);
    let resolver = Resolver::new(&index);
    let names: Vec<&str> = index.names().collect();
    group.throughput(Throughput::Elements(names.len() as u64));

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let results: Vec<_> = names.iter().map(|name| resolver.unsatisfied(name)).collect();
            black_box(results)
        });
    });

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(resolver.check_each(&names)));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_index_build, bench_single_query, bench_batch_query, bench_check_all
}
criterion_main!(benches);
