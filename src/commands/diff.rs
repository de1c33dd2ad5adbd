// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Diff command - simulated edits against their original values

use super::Globals;
use crate::analysis::country_matrix;
use crate::overrides::LinkOverride;
use crate::types::Cost;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// A country pair whose best cost changes under the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairChange {
    /// Source country
    pub from: String,
    /// Destination country
    pub to: String,
    /// Base topology cost, `None` when unreachable
    pub before: Option<Cost>,
    /// Simulated cost, `None` when unreachable
    pub after: Option<Cost>,
}

/// Everything the simulation changes
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    /// Overrides that differ from the base link
    pub links: Vec<LinkOverride>,
    /// Country pairs with a different best cost
    pub pairs: Vec<PairChange>,
}

/// Compare the base topology with the simulated one
pub fn run(globals: &Globals, topology: &Path) -> Result<()> {
    let session = globals.session(topology)?;
    let base = session.base().context("No topology loaded")?;
    let effective = globals.effective(&session)?;

    let analysis = &globals.config.analysis;
    let before = country_matrix(base, analysis.granularity, analysis.transit_pair_cap)?;
    let after = country_matrix(&effective, analysis.granularity, analysis.transit_pair_cap)?;

    let pairs: Vec<PairChange> = before
        .routes
        .iter()
        .filter_map(|route| {
            let old = route.path.as_ref().map(|p| p.cost);
            let new = after.cost(&route.from, &route.to);
            (old != new).then(|| PairChange {
                from: route.from.clone(),
                to: route.to.clone(),
                before: old,
                after: new,
            })
        })
        .collect();
    let report = DiffReport {
        links: session.overrides().modified().cloned().collect(),
        pairs,
    };

    let out = &globals.output;
    if out.json {
        return out.json(&report);
    }

    if report.links.is_empty() {
        println!("No simulated edits");
        return Ok(());
    }
    out.header("Simulated links");
    for record in &report.links {
        let link = base.link(record.index);
        let ends = link.map_or_else(String::new, |l| format!(" {} -- {}", l.source, l.target));
        println!(
            "  #{}{}: cost {}/{} -> {}/{}, status {} -> {}",
            record.index,
            ends,
            record.original_forward_cost,
            record.original_reverse_cost,
            record.forward_cost,
            record.reverse_cost,
            record.original_status,
            record.status,
        );
    }
    out.header("Country pairs");
    if report.pairs.is_empty() {
        println!("  no best cost changes");
    }
    let show = |cost: Option<Cost>| cost.map_or_else(|| out.unreachable(), |c| c.to_string());
    for change in &report.pairs {
        println!(
            "  {} -> {}: {} -> {}",
            change.from,
            change.to,
            show(change.before),
            show(change.after)
        );
    }
    Ok(())
}
