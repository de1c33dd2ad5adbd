// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Override layer - simulated cost/status edits on top of a base topology
//!
//! Overrides are keyed by link index, which is only meaningful within one
//! load of a topology. Every [`OverrideSet`] is therefore bound to the graph
//! generation it was built against; applying it to any other generation is
//! refused, and the session clears it on every reload.

use crate::error::OverrideError;
use crate::graph::TopologyGraph;
use crate::types::{Cost, Diagnostic, DiagnosticKind, Direction, Link, LinkIndex, LinkStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A requested change to one link; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdit {
    /// New source-to-target cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_cost: Option<Cost>,
    /// New target-to-source cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_cost: Option<Cost>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LinkStatus>,
}

impl LinkEdit {
    /// Edit that only changes the status
    #[must_use]
    pub fn status(status: LinkStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Edit that sets both costs
    #[must_use]
    pub fn costs(forward_cost: Cost, reverse_cost: Cost) -> Self {
        Self {
            forward_cost: Some(forward_cost),
            reverse_cost: Some(reverse_cost),
            status: None,
        }
    }

    /// Re-express an edit written from the point of view of a traversal in
    /// `direction` in terms of the stored link orientation
    #[must_use]
    pub fn oriented(self, direction: Direction) -> Self {
        match direction {
            Direction::Forward => self,
            Direction::Reverse => Self {
                forward_cost: self.reverse_cost,
                reverse_cost: self.forward_cost,
                status: self.status,
            },
        }
    }
}

/// Simulated state of one link together with its original values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOverride {
    /// Link the override applies to
    pub index: LinkIndex,
    /// Simulated source-to-target cost
    pub forward_cost: Cost,
    /// Simulated target-to-source cost
    pub reverse_cost: Cost,
    /// Simulated status
    pub status: LinkStatus,
    /// Base source-to-target cost
    pub original_forward_cost: Cost,
    /// Base target-to-source cost
    pub original_reverse_cost: Cost,
    /// Base status
    pub original_status: LinkStatus,
    /// Whether any simulated value differs from the base
    pub modified: bool,
}

impl LinkOverride {
    fn from_link(link: &Link) -> Self {
        Self {
            index: link.index,
            forward_cost: link.forward_cost,
            reverse_cost: link.reverse_cost,
            status: link.status.clone(),
            original_forward_cost: link.forward_cost,
            original_reverse_cost: link.reverse_cost,
            original_status: link.status.clone(),
            modified: false,
        }
    }

    fn apply(&mut self, edit: LinkEdit) {
        if let Some(cost) = edit.forward_cost {
            self.forward_cost = cost;
        }
        if let Some(cost) = edit.reverse_cost {
            self.reverse_cost = cost;
        }
        if let Some(status) = edit.status {
            self.status = status;
        }
        self.modified = self.forward_cost != self.original_forward_cost
            || self.reverse_cost != self.original_reverse_cost
            || self.status != self.original_status;
    }
}

/// The overrides of one simulation session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSet {
    generation: u64,
    entries: BTreeMap<LinkIndex, LinkOverride>,
}

impl OverrideSet {
    /// Empty set bound to a graph generation
    #[must_use]
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            entries: BTreeMap::new(),
        }
    }

    /// Generation this set is bound to
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of overridden links
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no link is overridden
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override for a link, if any
    #[must_use]
    pub fn get(&self, index: LinkIndex) -> Option<&LinkOverride> {
        self.entries.get(&index)
    }

    /// All overrides in link index order
    pub fn iter(&self) -> impl Iterator<Item = &LinkOverride> {
        self.entries.values()
    }

    /// Overrides whose simulated values differ from the base
    pub fn modified(&self) -> impl Iterator<Item = &LinkOverride> {
        self.entries.values().filter(|o| o.modified)
    }

    /// Drop every override and rebind to `generation`
    pub fn clear(&mut self, generation: u64) {
        if !self.entries.is_empty() {
            debug!(dropped = self.entries.len(), generation, "clearing overrides");
        }
        self.entries.clear();
        self.generation = generation;
    }

    /// Edit a link by index, merging with any earlier edit of the same link
    pub fn set(&mut self, base: &TopologyGraph, index: LinkIndex, edit: LinkEdit) -> Result<&LinkOverride, OverrideError> {
        self.check_generation(base)?;
        let link = base.link(index).ok_or(OverrideError::IndexOutOfRange(index))?;
        let entry = self
            .entries
            .entry(index)
            .or_insert_with(|| LinkOverride::from_link(link));
        entry.apply(edit);
        Ok(&*entry)
    }

    /// Edit the link joining two routers; costs in `edit` are read as the
    /// `from -> to` and `to -> from` directions
    pub fn set_between(
        &mut self,
        base: &TopologyGraph,
        from: &str,
        to: &str,
        edit: LinkEdit,
    ) -> Result<&LinkOverride, OverrideError> {
        let (index, direction) = base
            .find_link(from, to)
            .map(|(link, direction)| (link.index, direction))
            .ok_or_else(|| OverrideError::UnknownLink {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        self.set(base, index, edit.oriented(direction))
    }

    /// Stop simulating a link; returns the dropped override
    pub fn revert(&mut self, index: LinkIndex) -> Option<LinkOverride> {
        self.entries.remove(&index)
    }

    /// Insert a previously recorded override as-is, without range checks.
    ///
    /// Out-of-range records are caught by [`apply_overrides`].
    pub fn restore(&mut self, record: LinkOverride) {
        self.entries.insert(record.index, record);
    }

    fn check_generation(&self, graph: &TopologyGraph) -> Result<(), OverrideError> {
        if self.generation == graph.generation() {
            Ok(())
        } else {
            Err(OverrideError::StaleGeneration {
                overrides: self.generation,
                graph: graph.generation(),
            })
        }
    }
}

/// Produce the effective graph: `base` with every override's simulated values.
///
/// The base graph is not touched. Overrides pointing past the end of the link
/// arena are dropped with a [`DiagnosticKind::StaleOverride`] diagnostic.
pub fn apply_overrides(
    base: &TopologyGraph,
    overrides: &OverrideSet,
) -> Result<(TopologyGraph, Vec<Diagnostic>), OverrideError> {
    overrides.check_generation(base)?;

    let mut effective = base.clone();
    let mut diagnostics = Vec::new();

    for record in overrides.iter() {
        let Some(link) = effective.link_mut(record.index) else {
            let diagnostic = Diagnostic::new(
                DiagnosticKind::StaleOverride,
                format!(
                    "override for link {} dropped: topology has {} links",
                    record.index,
                    base.link_count()
                ),
            );
            warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
            continue;
        };
        link.set_costs(record.forward_cost, record.reverse_cost);
        link.status = record.status.clone();
    }

    Ok((effective, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::path::shortest_path;
    use crate::types::{RawLink, RawNode};

    fn base() -> TopologyGraph {
        let nodes: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| RawNode {
                id: (*id).into(),
                is_active: true,
                ..RawNode::default()
            })
            .collect();
        let links = vec![
            RawLink {
                source: "a".into(),
                target: "b".into(),
                cost: Some(1),
                ..RawLink::default()
            },
            RawLink {
                source: "b".into(),
                target: "c".into(),
                cost: Some(1),
                ..RawLink::default()
            },
            RawLink {
                source: "a".into(),
                target: "c".into(),
                cost: Some(5),
                ..RawLink::default()
            },
        ];
        normalize(&nodes, &links).unwrap().graph.with_generation(3)
    }

    #[test]
    fn test_apply_leaves_base_untouched() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        overrides.set(&base, 0, LinkEdit::status(LinkStatus::Down)).unwrap();

        let (effective, diagnostics) = apply_overrides(&base, &overrides).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(effective.link(0).unwrap().status, LinkStatus::Down);
        assert_eq!(base.link(0).unwrap().status, LinkStatus::Up);

        assert_eq!(shortest_path(&base, "a", "c").unwrap().unwrap().cost, 2);
        assert_eq!(shortest_path(&effective, "a", "c").unwrap().unwrap().cost, 5);
    }

    #[test]
    fn test_edits_merge_and_track_originals() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        overrides
            .set(&base, 2, LinkEdit { forward_cost: Some(9), ..LinkEdit::default() })
            .unwrap();
        let record = overrides
            .set(&base, 2, LinkEdit { reverse_cost: Some(4), ..LinkEdit::default() })
            .unwrap();

        assert_eq!((record.forward_cost, record.reverse_cost), (9, 4));
        assert_eq!((record.original_forward_cost, record.original_reverse_cost), (5, 5));
        assert!(record.modified);

        let (effective, _) = apply_overrides(&base, &overrides).unwrap();
        let link = effective.link(2).unwrap();
        assert_eq!(link.cost, 9);
        assert!(link.is_asymmetric);
    }

    #[test]
    fn test_edit_back_to_original_is_not_modified() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        overrides.set(&base, 1, LinkEdit::costs(7, 7)).unwrap();
        overrides.set(&base, 1, LinkEdit::costs(1, 1)).unwrap();

        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.modified().count(), 0);
    }

    #[test]
    fn test_set_between_orients_costs() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        // link 2 is stored a -> c; edit is written c -> a
        let record = overrides.set_between(&base, "c", "a", LinkEdit::costs(11, 2)).unwrap();
        assert_eq!(record.index, 2);
        assert_eq!((record.forward_cost, record.reverse_cost), (2, 11));

        let err = overrides.set_between(&base, "a", "zz", LinkEdit::default()).unwrap_err();
        assert!(matches!(err, OverrideError::UnknownLink { .. }));
    }

    #[test]
    fn test_stale_generation_is_refused() {
        let base = base();
        let overrides = OverrideSet::new(2);
        assert_eq!(
            apply_overrides(&base, &overrides).unwrap_err(),
            OverrideError::StaleGeneration { overrides: 2, graph: 3 }
        );

        let mut overrides = OverrideSet::new(2);
        assert!(overrides.set(&base, 0, LinkEdit::default()).is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        assert_eq!(
            overrides.set(&base, 42, LinkEdit::default()).unwrap_err(),
            OverrideError::IndexOutOfRange(42)
        );

        let mut record = overrides.set(&base, 0, LinkEdit::costs(3, 3)).unwrap().clone();
        record.index = 42;
        overrides.restore(record);

        let (effective, diagnostics) = apply_overrides(&base, &overrides).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::StaleOverride);
        assert_eq!(effective.link(0).unwrap().forward_cost, 3);
    }

    #[test]
    fn test_revert_and_clear() {
        let base = base();
        let mut overrides = OverrideSet::new(3);
        overrides.set(&base, 0, LinkEdit::costs(2, 2)).unwrap();
        overrides.set(&base, 1, LinkEdit::costs(2, 2)).unwrap();

        assert_eq!(overrides.revert(0).map(|o| o.index), Some(0));
        assert!(overrides.revert(0).is_none());

        overrides.clear(4);
        assert!(overrides.is_empty());
        assert_eq!(overrides.generation(), 4);
    }
}
