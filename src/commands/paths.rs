// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Paths command - bounded enumeration of simple paths

use super::Globals;
use crate::path::all_paths;
use anyhow::{bail, Result};
use std::path::Path;

/// Print every simple path from `from` to `to`, cheapest first
pub fn run(
    globals: &Globals,
    topology: &Path,
    from: &str,
    to: &str,
    max_hops: Option<usize>,
    max_results: Option<usize>,
) -> Result<()> {
    let graph = globals.effective_graph(topology)?;
    for id in [from, to] {
        if graph.node(id).is_none() {
            bail!("Unknown router: {id}");
        }
    }

    let max_hops = max_hops.unwrap_or(globals.config.analysis.max_hops);
    let max_results = max_results.unwrap_or(globals.config.analysis.max_results);
    let paths = all_paths(&graph, from, to, max_hops, max_results)?;

    let out = &globals.output;
    if out.json {
        return out.json(&paths);
    }

    if paths.is_empty() {
        println!("{from} -> {to}: {} within {max_hops} hops", out.unreachable());
        return Ok(());
    }
    for (rank, path) in paths.iter().enumerate() {
        println!("{:>3}. {}", rank + 1, out.path_line(path));
    }
    if paths.len() == max_results {
        out.warning(&format!("stopped at {max_results} paths; raise --max-results to see more"));
    }
    Ok(())
}
