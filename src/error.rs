// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for loading, querying and simulating topologies

use crate::types::{Cost, Direction, LinkIndex};

/// Structural problems that reject a whole topology load
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The node list is missing or empty
    #[error("topology contains no nodes")]
    EmptyNodeList,

    /// A node record has no identifier
    #[error("node #{position} has an empty identifier")]
    EmptyNodeId {
        /// Zero-based position in the input node list
        position: usize,
    },

    /// Two node records share an identifier
    #[error("duplicate node identifier '{0}'")]
    DuplicateNodeId(String),

    /// The input is not a topology document
    #[error("unparsable topology input: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of a single path query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A reachable arc has a non-positive weight
    #[error("link {link} ({from} -> {to}, {direction:?}) has non-positive cost {cost}")]
    InvalidWeight {
        /// Offending link
        link: LinkIndex,
        /// Router the arc leaves
        from: String,
        /// Router the arc enters
        to: String,
        /// Traversal direction of the arc
        direction: Direction,
        /// The offending value
        cost: Cost,
    },

    /// A path's total cost does not fit in [`Cost`]
    #[error("path {from} -> {to} costs more than {max}", max = Cost::MAX)]
    CostOverflow {
        /// First router of the path
        from: String,
        /// Last router of the path
        to: String,
        /// Last link of the path
        link: LinkIndex,
    },
}

/// Misuse of the override layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    /// Overrides built against another load of the topology
    #[error("overrides belong to topology generation {overrides}, graph is generation {graph}")]
    StaleGeneration {
        /// Generation the override set is bound to
        overrides: u64,
        /// Generation of the graph they were applied to
        graph: u64,
    },

    /// No base topology has been loaded yet
    #[error("no topology loaded")]
    NoTopology,

    /// Edit targets an index that does not exist
    #[error("link index {0} is outside the current topology")]
    IndexOutOfRange(LinkIndex),

    /// Edit addressed by endpoints that share no link
    #[error("no link between '{from}' and '{to}'")]
    UnknownLink {
        /// First endpoint
        from: String,
        /// Second endpoint
        to: String,
    },
}

/// Failures of aggregate computations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// An underlying path query failed
    #[error(transparent)]
    Path(#[from] PathError),

    /// A baseline result was computed from a different topology
    #[error("baseline computed from topology {baseline}, current topology is {current}")]
    StaleBaseline {
        /// Fingerprint recorded in the baseline
        baseline: String,
        /// Fingerprint of the graph passed in
        current: String,
    },
}

/// Any library error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`TopologyError`]
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// See [`PathError`]
    #[error(transparent)]
    Path(#[from] PathError),
    /// See [`OverrideError`]
    #[error(transparent)]
    Override(#[from] OverrideError),
    /// See [`AnalysisError`]
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Library result alias
pub type Result<T, E = Error> = std::result::Result<T, E>;
