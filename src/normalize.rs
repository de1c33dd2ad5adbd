// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Topology normalizer - turns raw exporter records into a [`TopologyGraph`]
//!
//! Node problems are structural and reject the load. Link problems are
//! record-level: the record is excluded, a [`Diagnostic`] is emitted and the
//! load carries on.

use crate::error::TopologyError;
use crate::graph::TopologyGraph;
use crate::types::{Diagnostic, DiagnosticKind, Link, LinkIndex, LinkStatus, Node, RawLink, RawNode, RawTopology};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Country assigned to routers whose record has none
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Kind assigned to routers whose record has none
pub const DEFAULT_KIND: &str = "router";

/// A freshly normalized topology and the record-level problems found on the way
#[derive(Debug, Clone)]
pub struct Normalized {
    /// The validated graph
    pub graph: TopologyGraph,
    /// Excluded or merged records
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a JSON topology document
pub fn parse_topology(json: &str) -> Result<RawTopology, TopologyError> {
    Ok(serde_json::from_str(json)?)
}

/// Normalize a complete topology document
pub fn normalize_topology(raw: &RawTopology) -> Result<Normalized, TopologyError> {
    normalize(&raw.nodes, &raw.links)
}

/// Normalize raw node and link records.
///
/// Links are merged per unordered endpoint pair: the first record creates the
/// link (reverse cost defaults to the forward cost), a record in the opposite
/// orientation sets the reverse cost, a record in the same orientation
/// replaces the forward cost. Link indices follow creation order.
pub fn normalize(raw_nodes: &[RawNode], raw_links: &[RawLink]) -> Result<Normalized, TopologyError> {
    if raw_nodes.is_empty() {
        return Err(TopologyError::EmptyNodeList);
    }

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    let mut lookup = HashMap::with_capacity(raw_nodes.len());

    for (position, raw) in raw_nodes.iter().enumerate() {
        if raw.id.trim().is_empty() {
            return Err(TopologyError::EmptyNodeId { position });
        }
        if lookup.insert(raw.id.clone(), nodes.len()).is_some() {
            return Err(TopologyError::DuplicateNodeId(raw.id.clone()));
        }
        nodes.push(node_from_raw(raw));
    }

    let mut links: Vec<Link> = Vec::new();
    let mut ends: Vec<(usize, usize)> = Vec::new();
    let mut pairs: HashMap<(usize, usize), LinkIndex> = HashMap::new();
    let mut diagnostics = Vec::new();

    for (position, raw) in raw_links.iter().enumerate() {
        let (Some(&from), Some(&to)) = (lookup.get(&raw.source), lookup.get(&raw.target)) else {
            let missing = if lookup.contains_key(&raw.source) { &raw.target } else { &raw.source };
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownEndpoint,
                format!("link #{position} {} -> {}: unknown router '{missing}'", raw.source, raw.target),
            ));
            continue;
        };

        if from == to {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::SelfLoop,
                format!("link #{position} connects '{}' to itself", raw.source),
            ));
            continue;
        }

        let Some(cost) = raw.oriented_cost() else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingCost,
                format!("link #{position} {} -> {} has no cost", raw.source, raw.target),
            ));
            continue;
        };

        let key = (from.min(to), from.max(to));
        match pairs.get(&key) {
            None => {
                let index = links.len();
                let reverse = raw.reverse_cost.unwrap_or(cost);
                let status = raw.status.clone().map(LinkStatus::from).unwrap_or_default();
                links.push(Link::new(index, &raw.source, &raw.target, cost, reverse, status));
                ends.push((from, to));
                pairs.insert(key, index);
            }
            Some(&index) => {
                let link = &mut links[index];
                if link.source == raw.source {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DuplicateRecord,
                        format!(
                            "link #{position} repeats {} -> {}; later cost {cost} replaces {}",
                            raw.source, raw.target, link.forward_cost
                        ),
                    ));
                    let reverse = raw.reverse_cost.unwrap_or(link.reverse_cost);
                    link.set_costs(cost, reverse);
                } else {
                    debug!(index, cost, "merging reverse orientation {} -> {}", raw.source, raw.target);
                    let forward = link.forward_cost;
                    link.set_costs(forward, cost);
                }
                if let Some(status) = &raw.status {
                    link.status = LinkStatus::from(status.clone());
                }
            }
        }
    }

    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }
    debug!(
        nodes = nodes.len(),
        links = links.len(),
        diagnostics = diagnostics.len(),
        "normalized topology"
    );

    Ok(Normalized {
        graph: TopologyGraph::assemble(nodes, lookup, links, ends),
        diagnostics,
    })
}

fn node_from_raw(raw: &RawNode) -> Node {
    Node {
        id: raw.id.clone(),
        name: raw
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| raw.id.clone()),
        country: raw
            .country
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        is_active: raw.is_active,
        kind: raw.kind.clone().unwrap_or_else(|| DEFAULT_KIND.to_string()),
        x: raw.x,
        y: raw.y,
    }
}
