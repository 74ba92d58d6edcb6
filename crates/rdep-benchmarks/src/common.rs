//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use rdep_repo::{ParseOptions, Repository};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Shape of a generated repository
#[derive(Debug, Clone, Copy)]
pub struct RepoShape {
    pub names: usize,
    pub versions_per_name: usize,
    pub deps_per_package: usize,
}

impl RepoShape {
    pub fn new(names: usize) -> Self {
        Self {
            names,
            versions_per_name: 2,
            deps_per_package: 4,
        }
    }
}

/// PACKAGES text for a layered repository: package `pkgN` depends on
/// lower-numbered packages only, and roughly one reference in ten asks for
/// a version that does not exist.
pub fn synthetic_packages(shape: RepoShape) -> String {
    let mut content = String::new();

    for n in 0..shape.names {
        for v in 0..shape.versions_per_name {
            content.push_str(&format!("Package: pkg{}\n", n));
            content.push_str(&format!("Version: {}.{}-{}\n", v + 1, n % 10, n % 3));

            let deps: Vec<String> = (1..=shape.deps_per_package.min(n))
                .map(|offset| {
                    let target = n - offset;
                    match (n + offset) % 10 {
                        0 => format!("pkg{} (>= 99.0)", target),
                        1 | 2 => format!("pkg{} (>= 1.0)", target),
                        _ => format!("pkg{}", target),
                    }
                })
                .collect();

            if !deps.is_empty() {
                let (depends, imports) = deps.split_at(deps.len() / 2);
                if !depends.is_empty() {
                    content.push_str(&format!("Depends: R (>= 3.5.0), {}\n", depends.join(", ")));
                }
                content.push_str(&format!("Imports: {}\n", imports.join(",\n    ")));
            }
            content.push_str("NeedsCompilation: no\n\n");
        }
    }

    content
}

/// Parser options used throughout the benchmarks: `R` is not a package
pub fn bench_options() -> ParseOptions {
    ParseOptions::new().skip_dependency("R")
}

/// A parsed synthetic repository
pub fn synthetic_repository(shape: RepoShape) -> Repository {
    let mut repository = Repository::new();
    // Generated text is always well formed
    if let Err(e) = repository.read(synthetic_packages(shape).as_bytes(), &bench_options()) {
        panic!("synthetic repository failed to parse: {}", e);
    }
    repository
}
