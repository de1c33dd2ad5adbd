// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Impact command - which country pairs a set of failures reroutes or cuts off

use super::Globals;
use crate::analysis::{country_matrix, downstream_impact, FailureSet, ImpactOutcome};
use crate::types::LinkIndex;
use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

/// Fail the given links and routers and report the affected country pairs
pub fn run(globals: &Globals, topology: &Path, links: Vec<LinkIndex>, nodes: Vec<String>) -> Result<()> {
    let failures = FailureSet {
        links: links.into_iter().collect(),
        nodes: nodes.into_iter().collect(),
    };
    if failures.is_empty() {
        bail!("Nothing to fail: pass --fail-link and/or --fail-node");
    }

    let graph = globals.effective_graph(topology)?;
    let analysis = &globals.config.analysis;
    let baseline = country_matrix(&graph, analysis.granularity, analysis.transit_pair_cap)?;
    info!(
        links = failures.links.len(),
        nodes = failures.nodes.len(),
        "Computing downstream impact"
    );
    let report = downstream_impact(&graph, &baseline, &failures)?;

    let out = &globals.output;
    out.diagnostics(&report.diagnostics);
    if out.json {
        return out.json(&report);
    }

    out.header(&format!(
        "{} of {} country pairs affected",
        report.impacts.len(),
        report.pairs_recomputed + report.pairs_unaffected
    ));
    for impact in &report.impacts {
        let after = match (impact.outcome, impact.cost_delta) {
            (ImpactOutcome::Rerouted, Some(delta)) => format!("rerouted, cost {delta:+}"),
            _ => out.unreachable(),
        };
        println!("  {} -> {}: {}", impact.from, impact.to, after);
    }
    if !report.countries.is_empty() {
        out.header("Per country");
        for country in &report.countries {
            println!(
                "  {:<8} {} affected, {} disconnected",
                country.country, country.affected_pairs, country.disconnected_pairs
            );
        }
    }
    if report.baseline_truncated {
        out.warning("baseline matrix was truncated; pairs beyond the cap are not covered");
    }
    Ok(())
}
