// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! File formats: topology documents in, scenario files in, exports out

use crate::error::OverrideError;
use crate::graph::TopologyGraph;
use crate::normalize::parse_topology;
use crate::overrides::LinkEdit;
use crate::session::Session;
use crate::types::{Cost, Diagnostic, DiagnosticKind, LinkIndex, LinkStatus, RawTopology};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One simulated edit in a scenario file.
///
/// The link is addressed either by `link` index or by `source`/`target`
/// routers; with endpoints, the costs are read in the `source -> target`
/// orientation whatever the stored orientation is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEdit {
    /// Link index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkIndex>,
    /// First router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Second router
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// New cost in the addressed orientation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_cost: Option<Cost>,
    /// New cost against the addressed orientation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_cost: Option<Cost>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ScenarioEdit {
    fn edit(&self) -> LinkEdit {
        LinkEdit {
            forward_cost: self.forward_cost,
            reverse_cost: self.reverse_cost,
            status: self.status.clone().map(LinkStatus::from),
        }
    }
}

/// A what-if scenario: a list of link edits.
///
/// Link indices only mean something for the dataset they were taken from, so
/// a scenario with index-addressed edits may pin that dataset's fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Fingerprint of the topology the link indices refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Edits, applied in order
    #[serde(default, rename = "edit")]
    pub edits: Vec<ScenarioEdit>,
}

/// Read a topology document from disk
pub fn read_topology(path: &Path) -> Result<RawTopology> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_topology(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read a TOML scenario file from disk
pub fn read_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Apply every edit of a scenario to a session.
///
/// Returns the number of edits applied plus a [`DiagnosticKind::StaleOverride`]
/// diagnostic for every index-addressed edit past the end of the link list.
/// Index-addressed edits are refused outright when the scenario pins a
/// fingerprint other than the loaded topology's.
pub fn apply_scenario(session: &mut Session, scenario: &Scenario) -> Result<(usize, Vec<Diagnostic>)> {
    let base = session.base().context("No topology loaded")?;
    if let Some(pinned) = &scenario.fingerprint {
        let current = base.fingerprint();
        if *pinned != current && scenario.edits.iter().any(|e| e.link.is_some()) {
            bail!("scenario link indices refer to topology {pinned}, loaded topology is {current}");
        }
    }

    let mut applied = 0;
    let mut diagnostics = Vec::new();
    for (n, entry) in scenario.edits.iter().enumerate() {
        let edit = entry.edit();
        let result = match (entry.link, entry.source.as_deref(), entry.target.as_deref()) {
            (Some(index), None, None) => session.edit_link(index, edit),
            (None, Some(source), Some(target)) => session.edit_between(source, target, edit),
            _ => bail!("scenario edit #{n} must name either `link` or both `source` and `target`"),
        };
        match result {
            Ok(record) => {
                debug!(
                    link = record.index,
                    forward = record.forward_cost,
                    reverse = record.reverse_cost,
                    status = %record.status,
                    "override applied"
                );
                applied += 1;
            }
            Err(OverrideError::IndexOutOfRange(index)) => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::StaleOverride,
                    format!("scenario edit #{n} dropped: link {index} does not exist"),
                );
                warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
            }
            Err(err) => return Err(err).with_context(|| format!("Failed to apply scenario edit #{n}")),
        }
    }
    info!(edits = applied, dropped = diagnostics.len(), "scenario applied");
    Ok((applied, diagnostics))
}

/// Serialize a graph in the input shape, stamped with the export time
pub fn export_json(graph: &TopologyGraph) -> Result<String> {
    let mut raw = graph.to_raw();
    raw.exported_at = Some(Utc::now());
    serde_json::to_string_pretty(&raw).context("Failed to serialize topology")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_topology;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SQUARE: &str = r#"{
        "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}],
        "links": [
            {"source": "a", "target": "b", "cost": 1},
            {"source": "b", "target": "c", "cost": 1},
            {"source": "c", "target": "d", "cost": 1},
            {"source": "d", "target": "a", "cost": 1}
        ]
    }"#;

    #[test]
    fn test_scenario_by_index_and_endpoints() {
        let scenario: Scenario = toml::from_str(
            r#"
            [[edit]]
            link = 0
            status = "down"

            [[edit]]
            source = "a"
            target = "d"
            forward_cost = 30
            reverse_cost = 4
            "#,
        )
        .unwrap();

        let mut session = Session::new();
        session.load_json(SQUARE).unwrap();
        let (applied, diagnostics) = apply_scenario(&mut session, &scenario).unwrap();
        assert_eq!(applied, 2);
        assert!(diagnostics.is_empty());

        let (graph, _) = session.effective_graph().unwrap();
        assert_eq!(graph.link(0).unwrap().status, LinkStatus::Down);
        // link 3 is stored d -> a
        let l = graph.link(3).unwrap();
        assert_eq!((l.forward_cost, l.reverse_cost), (4, 30));
    }

    #[test]
    fn test_scenario_edit_needs_an_address() {
        let scenario = Scenario {
            edits: vec![ScenarioEdit {
                source: Some("a".into()),
                ..ScenarioEdit::default()
            }],
            ..Scenario::default()
        };
        let mut session = Session::new();
        session.load_json(SQUARE).unwrap();
        assert!(apply_scenario(&mut session, &scenario).is_err());
    }

    #[test]
    fn test_out_of_range_edit_is_dropped_with_diagnostic() {
        let scenario: Scenario = toml::from_str(
            r#"
            [[edit]]
            link = 9
            status = "down"

            [[edit]]
            link = 1
            forward_cost = 5
            "#,
        )
        .unwrap();

        let mut session = Session::new();
        session.load_json(SQUARE).unwrap();
        let (applied, diagnostics) = apply_scenario(&mut session, &scenario).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::StaleOverride);
        assert_eq!(session.overrides().len(), 1);
    }

    #[test]
    fn test_pinned_fingerprint_guards_link_indices() {
        let mut session = Session::new();
        session.load_json(SQUARE).unwrap();
        let current = session.base().unwrap().fingerprint();

        let by_index = |fingerprint: &str| Scenario {
            fingerprint: Some(fingerprint.to_string()),
            edits: vec![ScenarioEdit {
                link: Some(0),
                forward_cost: Some(3),
                ..ScenarioEdit::default()
            }],
        };
        let err = apply_scenario(&mut session, &by_index("topo:0000000000000000")).unwrap_err();
        assert!(err.to_string().contains("refer to topology topo:0000000000000000"));
        assert!(session.overrides().is_empty());

        assert_eq!(apply_scenario(&mut session, &by_index(&current)).unwrap().0, 1);

        // endpoint-addressed edits do not depend on indices
        let by_endpoints = Scenario {
            fingerprint: Some("topo:0000000000000000".into()),
            edits: vec![ScenarioEdit {
                source: Some("a".into()),
                target: Some("b".into()),
                forward_cost: Some(3),
                ..ScenarioEdit::default()
            }],
        };
        assert_eq!(apply_scenario(&mut session, &by_endpoints).unwrap().0, 1);
    }

    #[test]
    fn test_export_round_trip_reproduces_simulated_state() {
        let mut session = Session::new();
        session.load_json(SQUARE).unwrap();
        session.edit_link(2, LinkEdit::costs(7, 3)).unwrap();
        let (effective, _) = session.effective_graph().unwrap();

        let json = export_json(&effective).unwrap();
        let reloaded = normalize_topology(&parse_topology(&json).unwrap()).unwrap().graph;

        assert_eq!(reloaded.fingerprint(), effective.fingerprint());
        assert_eq!(reloaded.link(2).unwrap().reverse_cost, 3);
    }

    #[test]
    fn test_read_topology_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();

        let err = read_topology(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
