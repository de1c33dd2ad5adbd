// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Topolens library - offline routing and impact analysis for link-state topologies
//!
//! This crate normalizes exported router/link records into a directed cost
//! graph and answers shortest-path, bounded all-paths, country transit and
//! failure-impact queries, optionally against simulated cost/status edits.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod io;
pub mod normalize;
pub mod output;
pub mod overrides;
pub mod path;
pub mod session;

/// Core data types shared by the normalizer, the engines and the exporters
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize};
    use std::fmt;

    /// Routing cost. Signed so that invalid (non-positive) input survives
    /// loading and is reported by the path engine instead of the parser.
    pub type Cost = i64;

    /// Stable position of a link inside one loaded dataset
    pub type LinkIndex = usize;

    // =========================================================================
    // Raw input records
    // =========================================================================

    /// Accept identifiers written either as strings or as bare numbers
    fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Null => Ok(String::new()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number identifier, found {other}"
            ))),
        }
    }

    fn default_true() -> bool {
        true
    }

    /// A node record as produced by the topology exporter
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RawNode {
        /// Router identifier
        #[serde(default, deserialize_with = "string_or_number")]
        pub id: String,
        /// Display name
        #[serde(default, alias = "label", skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        /// Country code (free-form)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub country: Option<String>,
        /// Whether the router takes part in routing
        #[serde(default = "default_true", alias = "active")]
        pub is_active: bool,
        /// Node kind (router, network, ...)
        #[serde(default, alias = "type", alias = "node_type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<String>,
        /// Layout x coordinate
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub x: Option<f64>,
        /// Layout y coordinate
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub y: Option<f64>,
    }

    /// A link record as produced by the topology exporter
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RawLink {
        /// Source router identifier
        #[serde(default, alias = "from", deserialize_with = "string_or_number")]
        pub source: String,
        /// Target router identifier
        #[serde(default, alias = "to", deserialize_with = "string_or_number")]
        pub target: String,
        /// Legacy single cost (source to target)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub cost: Option<Cost>,
        /// Cost source to target
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub forward_cost: Option<Cost>,
        /// Cost target to source
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub reverse_cost: Option<Cost>,
        /// Link status (up, down, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub status: Option<String>,
    }

    impl RawLink {
        /// Cost of this record in its own orientation
        #[must_use]
        pub fn oriented_cost(&self) -> Option<Cost> {
            self.forward_cost.or(self.cost)
        }
    }

    /// A complete exported topology file
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RawTopology {
        /// When this file was exported (set by our own exporter)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub exported_at: Option<DateTime<Utc>>,
        /// Router records
        #[serde(default)]
        pub nodes: Vec<RawNode>,
        /// Link records
        #[serde(default)]
        pub links: Vec<RawLink>,
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// A router in the normalized topology
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Node {
        /// Unique identifier, stable across reloads
        pub id: String,
        /// Display name
        pub name: String,
        /// Country code
        pub country: String,
        /// Inactive nodes are invisible to path queries
        pub is_active: bool,
        /// Node kind
        pub kind: String,
        /// Layout x coordinate, owned by the renderer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub x: Option<f64>,
        /// Layout y coordinate, owned by the renderer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub y: Option<f64>,
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Operational status of a link
    #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "String", into = "String")]
    pub enum LinkStatus {
        /// Carrying traffic
        #[default]
        Up,
        /// Administratively or operationally down; excluded from traversal
        Down,
        /// Any other exporter-specific status; still traversable
        Other(String),
    }

    impl LinkStatus {
        /// Whether path queries may use a link in this state
        #[must_use]
        pub fn is_traversable(&self) -> bool {
            !matches!(self, Self::Down)
        }

        /// Status keyword
        #[must_use]
        pub fn as_str(&self) -> &str {
            match self {
                Self::Up => "up",
                Self::Down => "down",
                Self::Other(s) => s,
            }
        }
    }

    impl From<String> for LinkStatus {
        fn from(s: String) -> Self {
            match s.trim().to_ascii_lowercase().as_str() {
                "up" | "" => Self::Up,
                "down" => Self::Down,
                _ => Self::Other(s),
            }
        }
    }

    impl From<&str> for LinkStatus {
        fn from(s: &str) -> Self {
            Self::from(s.to_string())
        }
    }

    impl From<LinkStatus> for String {
        fn from(status: LinkStatus) -> Self {
            status.as_str().to_string()
        }
    }

    impl fmt::Display for LinkStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Which way a link is being traversed
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Direction {
        /// source to target, weighted by `forward_cost`
        Forward,
        /// target to source, weighted by `reverse_cost`
        Reverse,
    }

    /// A physical point-to-point connection with per-direction costs
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Link {
        /// Stable index assigned at normalization time
        pub index: LinkIndex,
        /// Source router identifier
        pub source: String,
        /// Target router identifier
        pub target: String,
        /// Cost source to target
        pub forward_cost: Cost,
        /// Cost target to source
        pub reverse_cost: Cost,
        /// Legacy mirror of `forward_cost`
        pub cost: Cost,
        /// `forward_cost != reverse_cost`
        pub is_asymmetric: bool,
        /// Operational status
        pub status: LinkStatus,
    }

    impl Link {
        /// Create a link with consistent derived fields
        #[must_use]
        pub fn new(
            index: LinkIndex,
            source: impl Into<String>,
            target: impl Into<String>,
            forward_cost: Cost,
            reverse_cost: Cost,
            status: LinkStatus,
        ) -> Self {
            Self {
                index,
                source: source.into(),
                target: target.into(),
                forward_cost,
                reverse_cost,
                cost: forward_cost,
                is_asymmetric: forward_cost != reverse_cost,
                status,
            }
        }

        /// Replace both costs, keeping `cost` and `is_asymmetric` in step
        pub fn set_costs(&mut self, forward_cost: Cost, reverse_cost: Cost) {
            self.forward_cost = forward_cost;
            self.reverse_cost = reverse_cost;
            self.cost = forward_cost;
            self.is_asymmetric = forward_cost != reverse_cost;
        }

        /// Weight of traversing this link in `direction`
        #[must_use]
        pub fn cost_in(&self, direction: Direction) -> Cost {
            match direction {
                Direction::Forward => self.forward_cost,
                Direction::Reverse => self.reverse_cost,
            }
        }

        /// Direction of a traversal that starts at `node_id`
        #[must_use]
        pub fn direction_from(&self, node_id: &str) -> Option<Direction> {
            if self.source == node_id {
                Some(Direction::Forward)
            } else if self.target == node_id {
                Some(Direction::Reverse)
            } else {
                None
            }
        }
    }

    // =========================================================================
    // Results and diagnostics
    // =========================================================================

    /// One path through the topology
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PathResult {
        /// Visited routers, first is the source
        pub nodes: Vec<String>,
        /// Traversed link indices, `nodes.len() - 1` of them
        pub links: Vec<LinkIndex>,
        /// Sum of directional costs
        pub cost: Cost,
        /// Number of links traversed
        pub hops: usize,
    }

    impl PathResult {
        /// First router on the path
        #[must_use]
        pub fn source(&self) -> &str {
            self.nodes.first().map_or("", String::as_str)
        }

        /// Last router on the path
        #[must_use]
        pub fn target(&self) -> &str {
            self.nodes.last().map_or("", String::as_str)
        }

        /// Routers strictly between source and target
        #[must_use]
        pub fn transit_nodes(&self) -> &[String] {
            if self.nodes.len() < 3 {
                &[]
            } else {
                &self.nodes[1..self.nodes.len() - 1]
            }
        }
    }

    /// Category of a non-fatal load or simulation problem
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DiagnosticKind {
        /// Link references a router that is not in the node list
        UnknownEndpoint,
        /// Link connects a router to itself
        SelfLoop,
        /// Link record carries no usable cost
        MissingCost,
        /// Second record for a pair in the same orientation
        DuplicateRecord,
        /// Override references a link index outside the current graph
        StaleOverride,
        /// Failure set references an element the graph does not have
        UnknownElement,
    }

    /// A non-fatal problem reported alongside a successful result
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Diagnostic {
        /// Category
        pub kind: DiagnosticKind,
        /// Human-readable detail
        pub message: String,
    }

    impl Diagnostic {
        /// Create a diagnostic
        #[must_use]
        pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
            Self {
                kind,
                message: message.into(),
            }
        }
    }

    impl fmt::Display for Diagnostic {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::analysis::{country_matrix, downstream_impact, transit_exposure, FailureSet, Granularity};
    pub use crate::graph::TopologyGraph;
    pub use crate::normalize::{normalize, normalize_topology, Normalized};
    pub use crate::overrides::{apply_overrides, LinkEdit, OverrideSet};
    pub use crate::path::{all_paths, shortest_path};
    pub use crate::session::Session;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
