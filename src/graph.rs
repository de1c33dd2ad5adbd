// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph data structures for the normalized topology

use crate::types::{Cost, Direction, Link, LinkIndex, LinkStatus, Node, RawLink, RawNode, RawTopology};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};

/// One traversable arc of the induced directed view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Link being traversed
    pub link: LinkIndex,
    /// Node slot the arc leaves
    pub from: usize,
    /// Node slot the arc enters
    pub to: usize,
    /// Traversal direction relative to the stored link orientation
    pub direction: Direction,
    /// Directional weight
    pub cost: Cost,
}

/// Headline numbers for a topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyStats {
    /// Routers
    pub nodes: usize,
    /// Routers taking part in routing
    pub active_nodes: usize,
    /// Physical links
    pub links: usize,
    /// Links with status `down`
    pub down_links: usize,
    /// Links whose two directions cost differently
    pub asymmetric_links: usize,
    /// Countries of active routers, sorted
    pub countries: Vec<String>,
    /// Connected components of the traversable topology
    pub components: usize,
    /// Content fingerprint
    pub fingerprint: String,
}

/// The normalized topology: node and link arenas plus lookup structures.
///
/// Nodes are addressed internally by slot (position in `nodes`), links by
/// their stable [`LinkIndex`]. The value is never mutated by queries; the
/// override layer and failure analysis derive new graphs from it.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    /// Node id to slot
    lookup: HashMap<String, usize>,
    /// Link index to (source slot, target slot)
    ends: Vec<(usize, usize)>,
    /// Node slot to incident link indices, ascending
    adjacency: Vec<Vec<LinkIndex>>,
    /// Load counter assigned by the owning session
    generation: u64,
}

impl TopologyGraph {
    /// Assemble a graph from already validated parts.
    ///
    /// `ends[i]` must hold the node slots of `links[i]`, and `links[i].index == i`.
    pub(crate) fn assemble(
        nodes: Vec<Node>,
        lookup: HashMap<String, usize>,
        links: Vec<Link>,
        ends: Vec<(usize, usize)>,
    ) -> Self {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (index, &(a, b)) in ends.iter().enumerate() {
            adjacency[a].push(index);
            adjacency[b].push(index);
        }

        Self {
            nodes,
            links,
            lookup,
            ends,
            adjacency,
            generation: 0,
        }
    }

    /// Load counter this graph was installed under
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebind the graph to a load generation
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// All routers in load order
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, position equals index
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Get a router by identifier
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.lookup.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Slot of a router identifier
    #[must_use]
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    /// Router at a slot
    #[must_use]
    pub fn node_at(&self, slot: usize) -> &Node {
        &self.nodes[slot]
    }

    /// Get a link by index
    #[must_use]
    pub fn link(&self, index: LinkIndex) -> Option<&Link> {
        self.links.get(index)
    }

    pub(crate) fn link_mut(&mut self, index: LinkIndex) -> Option<&mut Link> {
        self.links.get_mut(index)
    }

    /// The link joining two routers, with the direction of an `a -> b` traversal
    #[must_use]
    pub fn find_link(&self, a: &str, b: &str) -> Option<(&Link, Direction)> {
        let slot = self.slot_of(a)?;
        self.adjacency[slot].iter().find_map(|&index| {
            let link = &self.links[index];
            if link.source == a && link.target == b {
                Some((link, Direction::Forward))
            } else if link.target == a && link.source == b {
                Some((link, Direction::Reverse))
            } else {
                None
            }
        })
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get link count
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Traversable arcs leaving a node slot, in ascending link index order.
    ///
    /// Inactive routers have no arcs, `down` links and links into inactive
    /// routers are skipped entirely.
    pub fn steps_from(&self, slot: usize) -> impl Iterator<Item = Step> + '_ {
        let active = self.nodes[slot].is_active;
        self.adjacency[slot]
            .iter()
            .filter(move |_| active)
            .filter_map(move |&index| {
                let link = &self.links[index];
                if !link.status.is_traversable() {
                    return None;
                }
                let (a, b) = self.ends[index];
                let (to, direction) = if a == slot {
                    (b, Direction::Forward)
                } else {
                    (a, Direction::Reverse)
                };
                if !self.nodes[to].is_active {
                    return None;
                }
                Some(Step {
                    link: index,
                    from: slot,
                    to,
                    direction,
                    cost: link.cost_in(direction),
                })
            })
    }

    /// Countries of active routers, sorted and deduplicated
    #[must_use]
    pub fn countries(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.is_active)
            .map(|n| n.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Derive a graph where the given links are down and routers inactive
    #[must_use]
    pub fn with_failures(&self, links: &BTreeSet<LinkIndex>, nodes: &BTreeSet<String>) -> Self {
        let mut degraded = self.clone();
        for &index in links {
            if let Some(link) = degraded.links.get_mut(index) {
                link.status = LinkStatus::Down;
            }
        }
        for id in nodes {
            if let Some(&slot) = degraded.lookup.get(id) {
                degraded.nodes[slot].is_active = false;
            }
        }
        degraded
    }

    /// SHA-256 over the routing-relevant content (layout fields excluded)
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for node in &self.nodes {
            hasher.update(node.id.as_bytes());
            hasher.update([0]);
            hasher.update(node.country.as_bytes());
            hasher.update([0]);
            hasher.update(node.kind.as_bytes());
            hasher.update([u8::from(node.is_active)]);
        }
        hasher.update([0xff]);
        for link in &self.links {
            hasher.update(link.index.to_le_bytes());
            hasher.update(link.source.as_bytes());
            hasher.update([0]);
            hasher.update(link.target.as_bytes());
            hasher.update([0]);
            hasher.update(link.forward_cost.to_le_bytes());
            hasher.update(link.reverse_cost.to_le_bytes());
            hasher.update(link.status.as_str().as_bytes());
            hasher.update([0]);
        }
        let hash = hex::encode(hasher.finalize());
        format!("topo:{}", &hash[..16])
    }

    /// Petgraph view of the traversable topology (active routers, non-down links)
    fn traversable_view(&self) -> UnGraph<usize, LinkIndex> {
        let mut view = UnGraph::with_capacity(self.nodes.len(), self.links.len());
        let mut indices: Vec<Option<NodeIndex>> = vec![None; self.nodes.len()];
        for (slot, node) in self.nodes.iter().enumerate() {
            if node.is_active {
                indices[slot] = Some(view.add_node(slot));
            }
        }
        for (index, link) in self.links.iter().enumerate() {
            let (a, b) = self.ends[index];
            if let (true, Some(ia), Some(ib)) = (link.status.is_traversable(), indices[a], indices[b]) {
                view.add_edge(ia, ib, index);
            }
        }
        view
    }

    /// Compute headline statistics
    #[must_use]
    pub fn stats(&self) -> TopologyStats {
        TopologyStats {
            nodes: self.nodes.len(),
            active_nodes: self.nodes.iter().filter(|n| n.is_active).count(),
            links: self.links.len(),
            down_links: self.links.iter().filter(|l| !l.status.is_traversable()).count(),
            asymmetric_links: self.links.iter().filter(|l| l.is_asymmetric).count(),
            countries: self.countries(),
            components: petgraph::algo::connected_components(&self.traversable_view()),
            fingerprint: self.fingerprint(),
        }
    }

    /// Convert back to the input record shape
    #[must_use]
    pub fn to_raw(&self) -> RawTopology {
        let nodes = self
            .nodes
            .iter()
            .map(|n| RawNode {
                id: n.id.clone(),
                name: Some(n.name.clone()),
                country: Some(n.country.clone()),
                is_active: n.is_active,
                kind: Some(n.kind.clone()),
                x: n.x,
                y: n.y,
            })
            .collect();

        let links = self
            .links
            .iter()
            .map(|l| RawLink {
                source: l.source.clone(),
                target: l.target.clone(),
                cost: Some(l.cost),
                forward_cost: Some(l.forward_cost),
                reverse_cost: Some(l.reverse_cost),
                status: Some(l.status.to_string()),
            })
            .collect();

        RawTopology {
            exported_at: None,
            nodes,
            links,
        }
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("graph topology {\n");
        dot.push_str("  layout=neato;\n");
        dot.push_str("  node [shape=box, style=rounded];\n");

        // Add routers, clustered by country
        for (n, country) in self.countries_all().iter().enumerate() {
            dot.push_str(&format!("\n  subgraph cluster_{n} {{\n"));
            dot.push_str(&format!("    label=\"{}\";\n", escape(country)));
            dot.push_str("    style=dashed;\n");
            for node in self.nodes.iter().filter(|n| &n.country == country) {
                let style = if node.is_active { "" } else { ", style=\"rounded,dashed\"" };
                dot.push_str(&format!(
                    "    \"{}\" [label=\"{}\"{}];\n",
                    escape(&node.id),
                    escape(&node.name),
                    style
                ));
            }
            dot.push_str("  }\n");
        }

        dot.push('\n');

        // Add links
        for link in &self.links {
            let label = if link.is_asymmetric {
                format!("{}/{}", link.forward_cost, link.reverse_cost)
            } else {
                link.forward_cost.to_string()
            };
            let style = if link.status.is_traversable() { "" } else { ", style=dashed" };
            dot.push_str(&format!(
                "  \"{}\" -- \"{}\" [label=\"{}\"{}];\n",
                escape(&link.source),
                escape(&link.target),
                label,
                style
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Every country, including those with only inactive routers
    fn countries_all(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
