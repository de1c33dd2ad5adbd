// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path engine - shortest path and bounded all-simple-paths search
//!
//! Both searches run over the directed view induced by the per-direction link
//! costs: a link A-B is an arc A->B weighted `forward_cost` and an arc B->A
//! weighted `reverse_cost`. Inactive routers and `down` links do not exist as
//! far as the engine is concerned.

use crate::error::PathError;
use crate::graph::{Step, TopologyGraph};
use crate::types::{Cost, LinkIndex, PathResult};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use tracing::debug;

/// Reject non-positive weights on every arc reachable from `sources`.
///
/// Runs before any search so that Dijkstra never sees a weight it cannot
/// handle. Arcs are inspected in breadth-first order, ascending link index,
/// so the reported offender is deterministic.
pub fn validate_reachable_weights(graph: &TopologyGraph, sources: &[usize]) -> Result<(), PathError> {
    let mut seen = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    for &slot in sources {
        if !seen[slot] {
            seen[slot] = true;
            queue.push_back(slot);
        }
    }

    while let Some(slot) = queue.pop_front() {
        for step in graph.steps_from(slot) {
            if step.cost <= 0 {
                return Err(invalid_weight(graph, step));
            }
            if !seen[step.to] {
                seen[step.to] = true;
                queue.push_back(step.to);
            }
        }
    }
    Ok(())
}

/// Narrow an exact path total back to [`Cost`]
fn total_cost(graph: &TopologyGraph, slots: &[usize], links: &[LinkIndex], total: i128) -> Result<Cost, PathError> {
    Cost::try_from(total).map_err(|_| PathError::CostOverflow {
        from: slots.first().map(|&s| graph.node_at(s).id.clone()).unwrap_or_default(),
        to: slots.last().map(|&s| graph.node_at(s).id.clone()).unwrap_or_default(),
        link: links.last().copied().unwrap_or_default(),
    })
}

fn invalid_weight(graph: &TopologyGraph, step: Step) -> PathError {
    PathError::InvalidWeight {
        link: step.link,
        from: graph.node_at(step.from).id.clone(),
        to: graph.node_at(step.to).id.clone(),
        direction: step.direction,
        cost: step.cost,
    }
}

/// Shortest path between two routers.
///
/// Returns `Ok(None)` when either router is absent or inactive, when they are
/// the same router, or when no traversable path joins them.
pub fn shortest_path(graph: &TopologyGraph, source: &str, target: &str) -> Result<Option<PathResult>, PathError> {
    let (Some(from), Some(to)) = (graph.slot_of(source), graph.slot_of(target)) else {
        return Ok(None);
    };
    if from == to {
        return Ok(None);
    }
    shortest_path_between(graph, &[from], |slot| slot == to)
}

/// Shortest path from any of `sources` to the first settled slot accepted by
/// `is_target` (a multi-source Dijkstra).
///
/// All sources start at distance zero, so the result is the cheapest path over
/// every (source, target) combination at the cost of a single search. Sources
/// that are themselves targets are ignored as destinations. Ties are broken
/// towards the lower node slot when settling and the lower link index when
/// choosing a predecessor.
pub fn shortest_path_between<F>(graph: &TopologyGraph, sources: &[usize], is_target: F) -> Result<Option<PathResult>, PathError>
where
    F: Fn(usize) -> bool,
{
    let sources: Vec<usize> = sources
        .iter()
        .copied()
        .filter(|&slot| graph.node_at(slot).is_active)
        .collect();
    if sources.is_empty() {
        return Ok(None);
    }
    validate_reachable_weights(graph, &sources)?;

    let n = graph.node_count();
    // Totals are accumulated exactly and narrowed once a path is chosen
    let mut dist: Vec<Option<i128>> = vec![None; n];
    let mut via: Vec<Option<(usize, LinkIndex)>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap: BinaryHeap<Reverse<(i128, usize)>> = BinaryHeap::new();

    for &slot in &sources {
        dist[slot] = Some(0);
        heap.push(Reverse((0, slot)));
    }

    while let Some(Reverse((d, slot))) = heap.pop() {
        if settled[slot] {
            continue;
        }
        settled[slot] = true;

        if via[slot].is_some() && is_target(slot) {
            debug!(cost = %d, settled = settled.iter().filter(|s| **s).count(), "shortest path found");
            return trace_back(graph, &via, slot, d).map(Some);
        }

        for step in graph.steps_from(slot) {
            if settled[step.to] {
                continue;
            }
            let candidate = d + i128::from(step.cost);
            let better = match (dist[step.to], via[step.to]) {
                (None, _) => true,
                (Some(current), Some((_, link))) => candidate < current || (candidate == current && step.link < link),
                (Some(current), None) => candidate < current,
            };
            if better {
                dist[step.to] = Some(candidate);
                via[step.to] = Some((slot, step.link));
                heap.push(Reverse((candidate, step.to)));
            }
        }
    }

    Ok(None)
}

/// Walk predecessor pointers back from `end` to a source
fn trace_back(
    graph: &TopologyGraph,
    via: &[Option<(usize, LinkIndex)>],
    end: usize,
    total: i128,
) -> Result<PathResult, PathError> {
    let mut slots = vec![end];
    let mut links = Vec::new();
    let mut current = end;
    while let Some((previous, link)) = via[current] {
        slots.push(previous);
        links.push(link);
        current = previous;
    }
    slots.reverse();
    links.reverse();
    let cost = total_cost(graph, &slots, &links, total)?;

    Ok(PathResult {
        nodes: slots.iter().map(|&s| graph.node_at(s).id.clone()).collect(),
        hops: links.len(),
        links,
        cost,
    })
}

/// All simple paths from `source` to `target` with at most `max_hops` links.
///
/// The depth-first search stops as soon as `max_results` paths have been
/// collected, so on dense graphs the result is the first `max_results` paths
/// in search order (ascending link index), not necessarily the cheapest ones.
/// The returned paths are sorted by cost, then hop count, then node sequence.
pub fn all_paths(
    graph: &TopologyGraph,
    source: &str,
    target: &str,
    max_hops: usize,
    max_results: usize,
) -> Result<Vec<PathResult>, PathError> {
    let (Some(from), Some(to)) = (graph.slot_of(source), graph.slot_of(target)) else {
        return Ok(Vec::new());
    };
    if from == to || max_hops == 0 || max_results == 0 {
        return Ok(Vec::new());
    }
    if !graph.node_at(from).is_active || !graph.node_at(to).is_active {
        return Ok(Vec::new());
    }
    validate_reachable_weights(graph, &[from])?;

    let mut search = PathSearch {
        graph,
        target: to,
        max_hops,
        max_results,
        on_path: vec![false; graph.node_count()],
        slots: vec![from],
        links: Vec::new(),
        cost: 0,
        found: Vec::new(),
    };
    search.on_path[from] = true;
    search.descend(from)?;

    let mut found = search.found;
    debug!(paths = found.len(), max_hops, max_results, "all-paths search finished");
    found.sort_by(|a, b| {
        a.cost
            .cmp(&b.cost)
            .then(a.hops.cmp(&b.hops))
            .then_with(|| a.nodes.cmp(&b.nodes))
    });
    Ok(found)
}

/// Depth-first search state for [`all_paths`]
struct PathSearch<'g> {
    graph: &'g TopologyGraph,
    target: usize,
    max_hops: usize,
    max_results: usize,
    /// Slots on the current path, for O(1) cycle checks
    on_path: Vec<bool>,
    slots: Vec<usize>,
    links: Vec<LinkIndex>,
    /// Exact running total; a path is rejected only if its final total overflows
    cost: i128,
    found: Vec<PathResult>,
}

impl PathSearch<'_> {
    fn descend(&mut self, at: usize) -> Result<(), PathError> {
        if at == self.target {
            return self.record();
        }
        if self.links.len() >= self.max_hops {
            return Ok(());
        }

        let graph = self.graph;
        for step in graph.steps_from(at) {
            if self.found.len() >= self.max_results {
                return Ok(());
            }
            if self.on_path[step.to] {
                continue;
            }

            self.on_path[step.to] = true;
            self.slots.push(step.to);
            self.links.push(step.link);
            self.cost += i128::from(step.cost);

            let outcome = self.descend(step.to);

            self.cost -= i128::from(step.cost);
            self.links.pop();
            self.slots.pop();
            self.on_path[step.to] = false;
            outcome?;
        }
        Ok(())
    }

    fn record(&mut self) -> Result<(), PathError> {
        let cost = total_cost(self.graph, &self.slots, &self.links, self.cost)?;
        self.found.push(PathResult {
            nodes: self.slots.iter().map(|&s| self.graph.node_at(s).id.clone()).collect(),
            links: self.links.clone(),
            cost,
            hops: self.links.len(),
        });
        Ok(())
    }
}
