// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Transit command - routers carrying traffic between other countries

use super::Globals;
use crate::analysis::{transit_exposure, Granularity};
use anyhow::Result;
use std::path::Path;

/// Print routers ranked by how many country pairs route through them
pub fn run(
    globals: &Globals,
    topology: &Path,
    granularity: Option<Granularity>,
    pair_cap: Option<usize>,
    top: Option<usize>,
) -> Result<()> {
    let graph = globals.effective_graph(topology)?;
    let granularity = granularity.unwrap_or(globals.config.analysis.granularity);
    let pair_cap = pair_cap.unwrap_or(globals.config.analysis.transit_pair_cap);
    let mut report = transit_exposure(&graph, granularity, pair_cap)?;
    if let Some(top) = top {
        report.entries.truncate(top);
    }

    let out = &globals.output;
    if out.json {
        return out.json(&report);
    }

    out.header(&format!("Transit exposure over {} country pairs", report.pairs_evaluated));
    if report.entries.is_empty() {
        println!("  no router carries transit traffic");
    }
    for entry in &report.entries {
        println!("  {:>5}  {} ({})", entry.count, entry.node, entry.country);
    }
    if report.truncated {
        out.warning(&format!("pair cap {pair_cap} reached; counts are partial"));
    }
    Ok(())
}
