// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Summary command - headline numbers for a topology

use super::Globals;
use anyhow::Result;
use std::path::Path;

/// Print counts, components and the fingerprint of the effective topology
pub fn run(globals: &Globals, topology: &Path) -> Result<()> {
    let session = globals.session(topology)?;
    let graph = globals.effective(&session)?;
    let stats = graph.stats();
    let out = &globals.output;

    if out.json {
        return out.json(&stats);
    }

    out.header(&format!("Topology {}", topology.display()));
    out.field("fingerprint", &stats.fingerprint);
    out.field("routers", format!("{} ({} active)", stats.nodes, stats.active_nodes));
    out.field("links", format!("{} ({} down)", stats.links, stats.down_links));
    out.field("asymmetric links", stats.asymmetric_links);
    out.field("components", stats.components);
    out.field("countries", stats.countries.join(", "));
    if !session.overrides().is_empty() {
        out.field("simulated edits", session.overrides().len());
    }
    Ok(())
}
