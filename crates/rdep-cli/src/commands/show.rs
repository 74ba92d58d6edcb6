//! `rdep show`: every version of one package.

use rdep_core::error::{RdepError, RdepResult};
use rdep_core::types::Package;
use rdep_resolver::Index;

use super::{CommandContext, Outcome};

pub async fn execute(package: String, ctx: &CommandContext) -> RdepResult<Outcome> {
    let (repository, _) = ctx.load_repository().await?;
    let index = Index::with_policy(&repository, ctx.config.selection());

    let versions = index.versions(&package);
    if versions.is_empty() {
        return Err(RdepError::PackageNotFound { name: package });
    }

    let selected = index.best_match(&package, None);
    ctx.output.print(&render(versions, selected));
    Ok(Outcome::Clean)
}

/// Versions highest first; the one a closure walk would descend into is
/// marked
pub fn render(versions: &[&Package], selected: Option<&Package>) -> String {
    let mut out = String::new();

    for &package in versions {
        let marker = match selected {
            Some(chosen) if std::ptr::eq(chosen, package) => " (selected)",
            _ => "",
        };
        out.push_str(&format!("{}{}\n", package, marker));

        if package.dependencies.is_empty() {
            out.push_str("  (no dependencies)\n");
        }
        for dependency in &package.dependencies {
            out.push_str(&format!("  {}\n", dependency));
        }
    }

    out
}
