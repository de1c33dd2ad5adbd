// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod diff;
pub mod export;
pub mod impact;
pub mod matrix;
pub mod path;
pub mod paths;
pub mod summary;
pub mod transit;

use crate::config::Config;
use crate::graph::TopologyGraph;
use crate::io::{apply_scenario, read_scenario, read_topology};
use crate::output::Output;
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Settings shared by every topology command
#[derive(Debug, Clone)]
pub struct Globals {
    /// Loaded configuration
    pub config: Config,
    /// Output handler
    pub output: Output,
    /// Scenario file simulated on top of the topology
    pub overrides: Option<PathBuf>,
}

impl Globals {
    /// Load `topology` into a fresh session and apply the scenario, if any
    pub fn session(&self, topology: &Path) -> Result<Session> {
        let raw = read_topology(topology)?;
        let mut session = Session::new();
        let diagnostics = session
            .load(&raw)
            .with_context(|| format!("Failed to load {}", topology.display()))?;
        self.output.diagnostics(&diagnostics);

        if let Some(path) = &self.overrides {
            let scenario = read_scenario(path)?;
            let (applied, diagnostics) = apply_scenario(&mut session, &scenario)
                .with_context(|| format!("Failed to apply {}", path.display()))?;
            self.output.diagnostics(&diagnostics);
            info!("Simulating {} edit(s) from {}", applied, path.display());
        }
        Ok(session)
    }

    /// The graph queries run against: base topology plus simulated edits
    pub fn effective_graph(&self, topology: &Path) -> Result<TopologyGraph> {
        let session = self.session(topology)?;
        self.effective(&session)
    }

    /// Effective graph of an already loaded session
    pub fn effective(&self, session: &Session) -> Result<TopologyGraph> {
        let (graph, diagnostics) = session
            .effective_graph()
            .context("Failed to apply simulated edits")?;
        self.output.diagnostics(&diagnostics);
        Ok(graph)
    }
}
