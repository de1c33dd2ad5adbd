// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path command - cheapest route between two routers

use super::Globals;
use crate::path::shortest_path;
use anyhow::{bail, Result};
use std::path::Path;

/// Print the shortest path from `from` to `to`
pub fn run(globals: &Globals, topology: &Path, from: &str, to: &str) -> Result<()> {
    let graph = globals.effective_graph(topology)?;
    for id in [from, to] {
        if graph.node(id).is_none() {
            bail!("Unknown router: {id}");
        }
    }

    let path = shortest_path(&graph, from, to)?;
    let out = &globals.output;
    if out.json {
        return out.json(&path);
    }

    match path {
        Some(path) => println!("{}", out.path_line(&path)),
        None => println!("{from} -> {to}: {}", out.unreachable()),
    }
    Ok(())
}
