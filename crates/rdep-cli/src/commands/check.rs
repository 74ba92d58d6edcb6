//! `rdep check`: report unsatisfied dependencies per package.

use rdep_core::error::{RdepError, RdepResult};
use rdep_resolver::{CheckReport, ClosureGraph, Index, Resolver};
use serde::Serialize;

use super::{CommandContext, Outcome};
use crate::Format;

pub async fn execute(
    packages: Vec<String>,
    all: bool,
    explain: bool,
    format: Format,
    ctx: &CommandContext,
) -> RdepResult<Outcome> {
    let (repository, _) = ctx.load_repository().await?;
    let index = Index::with_policy(&repository, ctx.config.selection());
    let resolver = Resolver::new(&index).with_revisit(ctx.config.revisit_policy());

    let names = if all {
        index.names().map(str::to_string).collect()
    } else {
        packages
    };
    let reports = resolver.check_each(&names);

    match format {
        Format::Text => {
            ctx.output.print(&render_text(&reports, explain));
            let problems = reports.iter().filter(|r| !r.is_satisfied()).count();
            if problems == 0 {
                ctx.output
                    .success(&format!("{} package(s) checked, all satisfied", reports.len()));
            } else {
                ctx.output.warn(&format!(
                    "{} of {} package(s) missing or unsatisfied",
                    problems,
                    reports.len()
                ));
            }
        }
        Format::Json => {
            let mut json = render_json(&reports, explain)?;
            json.push('\n');
            ctx.output.print(&json);
        }
    }

    if reports.iter().all(CheckReport::is_satisfied) {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::Problems)
    }
}

/// Plain report: a header per package, then either the not-found line or
/// the package name followed by one indented line per unsatisfied entry
pub fn render_text(reports: &[CheckReport], explain: bool) -> String {
    let mut out = String::new();

    for report in reports {
        out.push_str(&format!("Checking package {}\n", report.name));

        let Some(resolution) = &report.resolution else {
            out.push_str(&format!("    Package not found: {}\n", report.name));
            continue;
        };

        if !resolution.is_empty() {
            out.push_str(&format!("{}\n", report.name));
            for entry in resolution {
                out.push_str(&format!("  {}\n", entry));
                if explain {
                    if let Some(chain) = resolution.explain(entry) {
                        out.push_str(&format!("      via {}\n", chain.join(" -> ")));
                    }
                }
            }
        }

        if explain {
            for cycle in resolution.graph().cycles() {
                out.push_str(&format!("    cycle: {}\n", ClosureGraph::format_cycle(&cycle)));
            }
        }
    }

    out
}

#[derive(Serialize)]
struct PackageReport<'a> {
    package: &'a str,
    found: bool,
    unsatisfied: Vec<UnsatisfiedEntry<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cycles: Vec<Vec<&'a str>>,
}

#[derive(Serialize)]
struct UnsatisfiedEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<Vec<&'a str>>,
}

/// JSON array with one object per package, in input order
pub fn render_json(reports: &[CheckReport], explain: bool) -> RdepResult<String> {
    let packages: Vec<PackageReport<'_>> = reports
        .iter()
        .map(|report| {
            let unsatisfied = report
                .resolution
                .iter()
                .flatten()
                .map(|entry| UnsatisfiedEntry {
                    name: &entry.name,
                    constraint: entry.constraint.map(|c| c.to_string()),
                    path: report
                        .resolution
                        .as_ref()
                        .filter(|_| explain)
                        .and_then(|resolution| resolution.explain(entry)),
                })
                .collect();
            let cycles = match &report.resolution {
                Some(resolution) if explain => resolution.graph().cycles(),
                _ => Vec::new(),
            };

            PackageReport {
                package: &report.name,
                found: report.is_found(),
                unsatisfied,
                cycles,
            }
        })
        .collect();

    serde_json::to_string_pretty(&packages)
        .map_err(|e| RdepError::io("Failed to serialize check report", e.into()))
}
