//! `rdep stats`: repository counts and parse diagnostics.

use rdep_core::error::RdepResult;
use rdep_core::types::NameAndVersion;
use rdep_repo::{ReadSummary, Repository};
use rdep_resolver::{Index, Resolution, Resolver, SelectionPolicy};

use super::{CommandContext, Outcome};
use crate::output::errors::ErrorFormatter;

/// Figures reported by `rdep stats`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStats {
    pub bytes_read: usize,
    pub packages: usize,
    pub names: usize,
    pub multi_version_names: usize,
    pub references: usize,
    pub dropped_stanzas: usize,
    pub unsatisfied: usize,
    pub cycles: usize,
}

pub async fn execute(ctx: &CommandContext) -> RdepResult<Outcome> {
    let (repository, summary) = ctx.load_repository().await?;
    let index = Index::with_policy(&repository, ctx.config.selection());
    let resolver = Resolver::new(&index).with_revisit(ctx.config.revisit_policy());

    let stats = collect(&repository, &summary, &index, &resolve_all(&resolver));

    let path = ctx.packages_file();
    ctx.output.info(&format!("Repository: {}", path));
    ctx.output.print(&render(&stats));

    let formatter = ErrorFormatter::new();
    for diagnostic in &summary.diagnostics {
        eprint!("{}", formatter.format_diagnostic(path.as_str(), diagnostic));
    }

    if stats.dropped_stanzas == 0 && stats.unsatisfied == 0 {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::Problems)
    }
}

/// One batch query rooted at every name in the repository
fn resolve_all<P: SelectionPolicy>(resolver: &Resolver<'_, '_, P>) -> Resolution {
    let roots: Vec<NameAndVersion> = resolver.index().names().map(NameAndVersion::any).collect();
    resolver.unsatisfied_batch(&roots)
}

pub fn collect<P: SelectionPolicy>(
    repository: &Repository,
    summary: &ReadSummary,
    index: &Index<'_, P>,
    everything: &Resolution,
) -> RepositoryStats {
    RepositoryStats {
        bytes_read: summary.bytes_consumed,
        packages: index.package_count(),
        names: index.len(),
        multi_version_names: index.names().filter(|name| index.versions(name).len() > 1).count(),
        references: repository.iter().map(|p| p.dependencies.len()).sum(),
        dropped_stanzas: summary.diagnostics.len(),
        unsatisfied: everything.len(),
        cycles: everything.graph().cycles().len(),
    }
}

pub fn render(stats: &RepositoryStats) -> String {
    let rows = [
        ("Bytes read", stats.bytes_read),
        ("Packages", stats.packages),
        ("Distinct names", stats.names),
        ("Names with several versions", stats.multi_version_names),
        ("Dependency references", stats.references),
        ("Dropped stanzas", stats.dropped_stanzas),
        ("Unsatisfied references", stats.unsatisfied),
        ("Dependency cycles", stats.cycles),
    ];

    rows.iter()
        .map(|(label, value)| format!("  {:<28} {}\n", format!("{}:", label), value))
        .collect()
}
