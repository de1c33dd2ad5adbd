// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Aggregate analyzer - country matrix, transit exposure and failure impact
//!
//! Every aggregate is driven by one shortest-path computation per ordered
//! country pair. With [`Granularity::AllPairs`] that computation is a
//! multi-source search seeded with every active router of the source country
//! and stopped at the first router of the destination country, which yields
//! the minimum over all router pairs without a per-router loop.

use crate::error::{AnalysisError, PathError};
use crate::graph::TopologyGraph;
use crate::path::shortest_path_between;
use crate::types::{Cost, Diagnostic, DiagnosticKind, LinkIndex, PathResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// How a country is represented when routing between countries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// Best path over every router pair of the two countries
    #[default]
    AllPairs,
    /// Path between the lexicographically smallest active router of each country
    Representative,
}

/// An ordered pair of countries
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryPair {
    /// Source country
    pub from: String,
    /// Destination country
    pub to: String,
}

/// Best path between two countries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRoute {
    /// Source country
    pub from: String,
    /// Destination country
    pub to: String,
    /// `None` when the countries are not connected
    pub path: Option<PathResult>,
}

/// Cost/utilization matrix over all ordered country pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryMatrix {
    /// Fingerprint of the graph the matrix was computed from
    pub fingerprint: String,
    /// Country representation used
    pub granularity: Granularity,
    /// Countries of active routers, sorted
    pub countries: Vec<String>,
    /// One entry per evaluated ordered pair
    pub routes: Vec<CountryRoute>,
    /// How many best paths traverse each link
    pub link_utilization: BTreeMap<LinkIndex, usize>,
    /// The pair cap stopped the computation early
    pub truncated: bool,
}

impl CountryMatrix {
    /// Route between two countries, if that pair was evaluated
    #[must_use]
    pub fn route(&self, from: &str, to: &str) -> Option<&CountryRoute> {
        self.routes.iter().find(|r| r.from == from && r.to == to)
    }

    /// Cost between two countries, `None` when unreachable or not evaluated
    #[must_use]
    pub fn cost(&self, from: &str, to: &str) -> Option<Cost> {
        self.route(from, to)
            .and_then(|r| r.path.as_ref())
            .map(|p| p.cost)
    }
}

/// Pre-computed country lookups, built once per graph before any pair loop
struct CountryIndex {
    names: Vec<String>,
    position: HashMap<String, usize>,
    /// Active router slots per country, sorted by router id
    members: Vec<Vec<usize>>,
    /// Country position of each active router slot
    country_of: Vec<Option<usize>>,
}

impl CountryIndex {
    fn build(graph: &TopologyGraph) -> Self {
        let names = graph.countries();
        let position: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut members = vec![Vec::new(); names.len()];
        let mut country_of = vec![None; graph.node_count()];
        for (slot, node) in graph.nodes().iter().enumerate() {
            if !node.is_active {
                continue;
            }
            if let Some(&country) = position.get(&node.country) {
                members[country].push(slot);
                country_of[slot] = Some(country);
            }
        }
        for slots in &mut members {
            slots.sort_by(|&a, &b| graph.node_at(a).id.cmp(&graph.node_at(b).id));
        }

        Self {
            names,
            position,
            members,
            country_of,
        }
    }

    /// The single shortest-path computation for one ordered country pair
    fn route(
        &self,
        graph: &TopologyGraph,
        from: usize,
        to: usize,
        granularity: Granularity,
    ) -> Result<Option<PathResult>, PathError> {
        match granularity {
            Granularity::AllPairs => {
                shortest_path_between(graph, &self.members[from], |slot| self.country_of[slot] == Some(to))
            }
            Granularity::Representative => {
                let (Some(&a), Some(&b)) = (self.members[from].first(), self.members[to].first()) else {
                    return Ok(None);
                };
                shortest_path_between(graph, &[a], |slot| slot == b)
            }
        }
    }

    fn route_by_name(
        &self,
        graph: &TopologyGraph,
        from: &str,
        to: &str,
        granularity: Granularity,
    ) -> Result<Option<PathResult>, PathError> {
        match (self.position.get(from), self.position.get(to)) {
            (Some(&a), Some(&b)) => self.route(graph, a, b, granularity),
            _ => Ok(None),
        }
    }
}

/// Compute the best path for every ordered pair of distinct countries.
///
/// At most `pair_cap` pairs are evaluated; when the cap cuts the loop short
/// the matrix is flagged `truncated`.
pub fn country_matrix(
    graph: &TopologyGraph,
    granularity: Granularity,
    pair_cap: usize,
) -> Result<CountryMatrix, PathError> {
    let index = CountryIndex::build(graph);
    let mut routes = Vec::new();
    let mut truncated = false;

    'pairs: for from in 0..index.names.len() {
        for to in 0..index.names.len() {
            if from == to {
                continue;
            }
            if routes.len() >= pair_cap {
                truncated = true;
                break 'pairs;
            }
            let path = index.route(graph, from, to, granularity)?;
            routes.push(CountryRoute {
                from: index.names[from].clone(),
                to: index.names[to].clone(),
                path,
            });
        }
    }

    let mut link_utilization = BTreeMap::new();
    for path in routes.iter().filter_map(|r| r.path.as_ref()) {
        for &link in &path.links {
            *link_utilization.entry(link).or_insert(0) += 1;
        }
    }

    if truncated {
        warn!(pair_cap, "country matrix truncated");
    }
    info!(countries = index.names.len(), pairs = routes.len(), "country matrix computed");

    Ok(CountryMatrix {
        fingerprint: graph.fingerprint(),
        granularity,
        countries: index.names,
        routes,
        link_utilization,
        truncated,
    })
}

/// How exposed one router is to traffic between other countries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitEntry {
    /// Router identifier
    pub node: String,
    /// Router country
    pub country: String,
    /// Country pairs whose best path crosses this router
    pub pairs: Vec<CountryPair>,
    /// `pairs.len()`
    pub count: usize,
}

/// Transit exposure of every router that carries at least one country pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitReport {
    /// Fingerprint of the graph the report was computed from
    pub fingerprint: String,
    /// Ordered country pairs evaluated
    pub pairs_evaluated: usize,
    /// The pair cap stopped the computation early
    pub truncated: bool,
    /// Exposed routers, most exposed first
    pub entries: Vec<TransitEntry>,
}

/// Transit exposure, computed with one shortest path per ordered country pair
pub fn transit_exposure(
    graph: &TopologyGraph,
    granularity: Granularity,
    pair_cap: usize,
) -> Result<TransitReport, PathError> {
    let matrix = country_matrix(graph, granularity, pair_cap)?;
    Ok(transit_from_matrix(graph, &matrix))
}

/// Fold the best paths of a matrix into per-router transit exposure.
///
/// Only intermediate routers count; a path's own endpoints are not transit.
#[must_use]
pub fn transit_from_matrix(graph: &TopologyGraph, matrix: &CountryMatrix) -> TransitReport {
    let mut exposure: BTreeMap<&str, Vec<CountryPair>> = BTreeMap::new();
    for route in &matrix.routes {
        let Some(path) = &route.path else { continue };
        for node in path.transit_nodes() {
            exposure.entry(node.as_str()).or_default().push(CountryPair {
                from: route.from.clone(),
                to: route.to.clone(),
            });
        }
    }

    let mut entries: Vec<TransitEntry> = exposure
        .into_iter()
        .map(|(node, pairs)| TransitEntry {
            node: node.to_string(),
            country: graph.node(node).map(|n| n.country.clone()).unwrap_or_default(),
            count: pairs.len(),
            pairs,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.node.cmp(&b.node)));

    debug!(exposed = entries.len(), "transit exposure folded");

    TransitReport {
        fingerprint: matrix.fingerprint.clone(),
        pairs_evaluated: matrix.routes.len(),
        truncated: matrix.truncated,
        entries,
    }
}

/// Links and routers assumed to have failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSet {
    /// Failed link indices
    #[serde(default)]
    pub links: BTreeSet<LinkIndex>,
    /// Failed router identifiers
    #[serde(default)]
    pub nodes: BTreeSet<String>,
}

impl FailureSet {
    /// Whether nothing has failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.nodes.is_empty()
    }

    /// Whether a path uses any failed element, endpoints included
    #[must_use]
    pub fn touches(&self, path: &PathResult) -> bool {
        path.links.iter().any(|l| self.links.contains(l)) || path.nodes.iter().any(|n| self.nodes.contains(n))
    }
}

/// What happened to a country pair whose best path was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactOutcome {
    /// A new best path exists
    Rerouted,
    /// The countries are no longer connected
    Disconnected,
}

/// Before/after for one affected country pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairImpact {
    /// Source country
    pub from: String,
    /// Destination country
    pub to: String,
    /// Baseline best path
    pub before: PathResult,
    /// Best path with the failures applied
    pub after: Option<PathResult>,
    /// Rerouted or disconnected
    pub outcome: ImpactOutcome,
    /// `after.cost - before.cost` when still connected
    pub cost_delta: Option<Cost>,
}

/// Affected pair counts for one country (as source or destination)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryImpact {
    /// Country code
    pub country: String,
    /// Affected pairs involving this country
    pub affected_pairs: usize,
    /// Of those, pairs that lost connectivity
    pub disconnected_pairs: usize,
}

/// Downstream effect of a failure set on the country matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Fingerprint of the baseline matrix
    pub baseline_fingerprint: String,
    /// The baseline was itself truncated, so unevaluated pairs are not covered
    pub baseline_truncated: bool,
    /// Pairs whose baseline path touched a failure and were recomputed
    pub pairs_recomputed: usize,
    /// Pairs left as they were
    pub pairs_unaffected: usize,
    /// Per affected pair detail
    pub impacts: Vec<PairImpact>,
    /// Per country totals, most affected first
    pub countries: Vec<CountryImpact>,
    /// Failure references the graph does not know
    pub diagnostics: Vec<Diagnostic>,
}

/// Incrementally recompute the country pairs a failure set breaks.
///
/// Only pairs whose baseline best path touches a failed link or router are
/// recomputed, against a derived graph where the failed links are down and
/// the failed routers inactive. `baseline` must come from `graph`.
pub fn downstream_impact(
    graph: &TopologyGraph,
    baseline: &CountryMatrix,
    failures: &FailureSet,
) -> Result<ImpactReport, AnalysisError> {
    let current = graph.fingerprint();
    if current != baseline.fingerprint {
        return Err(AnalysisError::StaleBaseline {
            baseline: baseline.fingerprint.clone(),
            current,
        });
    }

    let mut diagnostics = Vec::new();
    for &link in &failures.links {
        if graph.link(link).is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownElement,
                format!("failed link {link} does not exist"),
            ));
        }
    }
    for node in &failures.nodes {
        if graph.node(node).is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownElement,
                format!("failed router '{node}' does not exist"),
            ));
        }
    }
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }

    let degraded = graph.with_failures(&failures.links, &failures.nodes);
    let index = CountryIndex::build(&degraded);

    let mut impacts = Vec::new();
    let mut pairs_unaffected = 0;
    for route in &baseline.routes {
        let Some(before) = route.path.as_ref().filter(|p| failures.touches(p)) else {
            pairs_unaffected += 1;
            continue;
        };
        let after = index.route_by_name(&degraded, &route.from, &route.to, baseline.granularity)?;
        let outcome = if after.is_some() {
            ImpactOutcome::Rerouted
        } else {
            ImpactOutcome::Disconnected
        };
        impacts.push(PairImpact {
            from: route.from.clone(),
            to: route.to.clone(),
            cost_delta: after.as_ref().map(|p| p.cost - before.cost),
            before: before.clone(),
            after,
            outcome,
        });
    }

    let mut per_country: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for impact in &impacts {
        let lost = usize::from(impact.outcome == ImpactOutcome::Disconnected);
        for country in [impact.from.as_str(), impact.to.as_str()] {
            let entry = per_country.entry(country).or_default();
            entry.0 += 1;
            entry.1 += lost;
        }
    }
    let mut countries: Vec<CountryImpact> = per_country
        .into_iter()
        .map(|(country, (affected_pairs, disconnected_pairs))| CountryImpact {
            country: country.to_string(),
            affected_pairs,
            disconnected_pairs,
        })
        .collect();
    countries.sort_by(|a, b| {
        b.affected_pairs
            .cmp(&a.affected_pairs)
            .then_with(|| a.country.cmp(&b.country))
    });

    info!(
        recomputed = impacts.len(),
        unaffected = pairs_unaffected,
        "downstream impact computed"
    );

    Ok(ImpactReport {
        baseline_fingerprint: baseline.fingerprint.clone(),
        baseline_truncated: baseline.truncated,
        pairs_recomputed: impacts.len(),
        pairs_unaffected,
        impacts,
        countries,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::{RawLink, RawNode};

    fn node(id: &str, country: &str) -> RawNode {
        RawNode {
            id: id.into(),
            country: Some(country.into()),
            is_active: true,
            ..RawNode::default()
        }
    }

    fn link(source: &str, target: &str, cost: i64) -> RawLink {
        RawLink {
            source: source.into(),
            target: target.into(),
            cost: Some(cost),
            ..RawLink::default()
        }
    }

    /// DE and FR both reach PL; FR only via DE's hub, with a costly backup
    fn europe() -> TopologyGraph {
        let nodes = vec![
            node("de-1", "DE"),
            node("de-hub", "DE"),
            node("fr-1", "FR"),
            node("pl-1", "PL"),
        ];
        let links = vec![
            link("de-1", "de-hub", 1),
            link("fr-1", "de-hub", 2),
            link("de-hub", "pl-1", 3),
            link("fr-1", "pl-1", 50),
        ];
        normalize(&nodes, &links).unwrap().graph
    }

    #[test]
    fn test_matrix_all_pairs_takes_minimum() {
        let graph = europe();
        let matrix = country_matrix(&graph, Granularity::AllPairs, 100).unwrap();

        assert_eq!(matrix.countries, vec!["DE", "FR", "PL"]);
        assert_eq!(matrix.routes.len(), 6);
        assert!(!matrix.truncated);
        // de-hub is itself in DE, so DE -> PL is the single hop
        assert_eq!(matrix.cost("DE", "PL"), Some(3));
        assert_eq!(matrix.route("DE", "PL").unwrap().path.as_ref().unwrap().nodes, vec!["de-hub", "pl-1"]);
        assert_eq!(matrix.cost("FR", "PL"), Some(5));
        assert_eq!(matrix.link_utilization.get(&2), Some(&4));
    }

    #[test]
    fn test_matrix_representative_uses_smallest_id() {
        let graph = europe();
        let matrix = country_matrix(&graph, Granularity::Representative, 100).unwrap();
        // representative of DE is de-1
        assert_eq!(matrix.cost("DE", "PL"), Some(4));
    }

    #[test]
    fn test_matrix_cap_truncates() {
        let graph = europe();
        let matrix = country_matrix(&graph, Granularity::AllPairs, 4).unwrap();
        assert_eq!(matrix.routes.len(), 4);
        assert!(matrix.truncated);
    }

    #[test]
    fn test_transit_counts_intermediate_routers_only() {
        let graph = europe();
        let report = transit_exposure(&graph, Granularity::AllPairs, 100).unwrap();

        // FR <-> PL both cross de-hub; no other pair has an intermediate router
        assert_eq!(report.entries.len(), 1);
        let hub = &report.entries[0];
        assert_eq!(hub.node, "de-hub");
        assert_eq!(hub.country, "DE");
        assert_eq!(hub.count, 2);
        assert_eq!(report.pairs_evaluated, 6);
    }

    #[test]
    fn test_impact_recomputes_only_touched_pairs() {
        let graph = europe();
        let baseline = country_matrix(&graph, Granularity::AllPairs, 100).unwrap();
        let failures = FailureSet {
            links: BTreeSet::from([1]),
            nodes: BTreeSet::new(),
        };

        let report = downstream_impact(&graph, &baseline, &failures).unwrap();
        // link 1 carries DE<->FR and FR<->PL in both directions
        assert_eq!(report.pairs_recomputed, 4);
        assert_eq!(report.pairs_unaffected, 2);

        let fr_pl = report.impacts.iter().find(|i| i.from == "FR" && i.to == "PL").unwrap();
        assert_eq!(fr_pl.outcome, ImpactOutcome::Rerouted);
        assert_eq!(fr_pl.cost_delta, Some(45));

        let fr = report.countries.iter().find(|c| c.country == "FR").unwrap();
        assert_eq!(fr.affected_pairs, 4);
    }

    #[test]
    fn test_impact_node_failure_disconnects() {
        let graph = europe();
        let baseline = country_matrix(&graph, Granularity::AllPairs, 100).unwrap();
        let failures = FailureSet {
            links: BTreeSet::from([3]),
            nodes: BTreeSet::from(["de-hub".to_string(), "ghost".to_string()]),
        };

        let report = downstream_impact(&graph, &baseline, &failures).unwrap();
        let de_pl = report.impacts.iter().find(|i| i.from == "DE" && i.to == "PL").unwrap();
        assert_eq!(de_pl.outcome, ImpactOutcome::Disconnected);
        assert!(de_pl.after.is_none());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::UnknownElement);
    }

    #[test]
    fn test_impact_rejects_stale_baseline() {
        let graph = europe();
        let baseline = country_matrix(&graph, Granularity::AllPairs, 100).unwrap();
        let changed = graph.with_failures(&BTreeSet::from([0]), &BTreeSet::new());

        let err = downstream_impact(&changed, &baseline, &FailureSet::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::StaleBaseline { .. }));
    }
}
