// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Simulation session - owns the base topology, its generation and the overrides

use crate::error::{OverrideError, Result, TopologyError};
use crate::graph::TopologyGraph;
use crate::normalize::{normalize_topology, parse_topology};
use crate::overrides::{apply_overrides, LinkEdit, LinkOverride, OverrideSet};
use crate::path::shortest_path;
use crate::types::{Diagnostic, LinkIndex, PathResult, RawTopology};
use tracing::info;

/// One analyst session: a loaded base topology plus simulated edits.
///
/// Every successful [`Session::load`] bumps the generation and clears the
/// overrides before the new graph is installed, so an override can never be
/// applied to a link index from another dataset.
#[derive(Debug, Default)]
pub struct Session {
    base: Option<TopologyGraph>,
    overrides: OverrideSet,
    generation: u64,
    simulation: bool,
}

impl Session {
    /// Create a session with no topology loaded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a topology document, replacing the current one.
    ///
    /// On a structural error the previous base graph stays installed, but the
    /// overrides are cleared and the simulation switched off either way.
    pub fn load(&mut self, raw: &RawTopology) -> Result<Vec<Diagnostic>, TopologyError> {
        self.overrides.clear(self.generation);
        self.simulation = false;

        let normalized = normalize_topology(raw)?;
        self.generation += 1;
        self.overrides.clear(self.generation);
        info!(
            generation = self.generation,
            nodes = normalized.graph.node_count(),
            links = normalized.graph.link_count(),
            "topology loaded"
        );
        self.base = Some(normalized.graph.with_generation(self.generation));
        Ok(normalized.diagnostics)
    }

    /// Parse and load a JSON topology document
    pub fn load_json(&mut self, json: &str) -> Result<Vec<Diagnostic>, TopologyError> {
        self.overrides.clear(self.generation);
        self.simulation = false;
        let raw = parse_topology(json)?;
        self.load(&raw)
    }

    /// The base topology, if one is loaded
    #[must_use]
    pub fn base(&self) -> Option<&TopologyGraph> {
        self.base.as_ref()
    }

    /// Current load generation (0 before the first load)
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a result computed at `generation` still describes the loaded topology
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.base.is_some() && generation == self.generation
    }

    /// The current overrides
    #[must_use]
    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Turn simulated edits on or off without discarding them
    pub fn set_simulation(&mut self, active: bool) {
        self.simulation = active;
    }

    /// Whether queries see the overrides
    #[must_use]
    pub fn simulation_active(&self) -> bool {
        self.simulation
    }

    /// Edit a link by index; activates the simulation
    pub fn edit_link(&mut self, index: LinkIndex, edit: LinkEdit) -> Result<&LinkOverride, OverrideError> {
        let base = self.base.as_ref().ok_or(OverrideError::NoTopology)?;
        self.simulation = true;
        self.overrides.set(base, index, edit)
    }

    /// Edit the link joining two routers; activates the simulation
    pub fn edit_between(&mut self, from: &str, to: &str, edit: LinkEdit) -> Result<&LinkOverride, OverrideError> {
        let base = self.base.as_ref().ok_or(OverrideError::NoTopology)?;
        self.simulation = true;
        self.overrides.set_between(base, from, to, edit)
    }

    /// Drop the override of one link
    pub fn revert(&mut self, index: LinkIndex) -> Option<LinkOverride> {
        self.overrides.revert(index)
    }

    /// Drop every override
    pub fn clear_overrides(&mut self) {
        self.overrides.clear(self.generation);
    }

    /// The graph queries should run against: the base graph, with the
    /// overrides merged in while the simulation is active
    pub fn effective_graph(&self) -> Result<(TopologyGraph, Vec<Diagnostic>), OverrideError> {
        let base = self.base.as_ref().ok_or(OverrideError::NoTopology)?;
        if self.simulation && !self.overrides.is_empty() {
            apply_overrides(base, &self.overrides)
        } else {
            Ok((base.clone(), Vec::new()))
        }
    }

    /// Shortest path on the effective graph
    pub fn shortest_path(&self, source: &str, target: &str) -> Result<Option<PathResult>> {
        let (graph, _) = self.effective_graph()?;
        Ok(shortest_path(&graph, source, target)?)
    }
}
