// In-memory property graph backed by petgraph. Used for dry runs and tests.

use super::GraphStore;
use crate::error::UpsertError;
use crate::mapper::{Upsert, UpsertPlan};
use crate::model::{AsnProps, HostProps, NodeLabel, RelType};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Host { url: String, props: HostProps },
    Ip { address: String },
    Tech { name: String },
    Asn(AsnProps),
}

impl GraphNode {
    pub fn label(&self) -> NodeLabel {
        match self {
            GraphNode::Host { .. } => NodeLabel::Host,
            GraphNode::Ip { .. } => NodeLabel::Ip,
            GraphNode::Tech { .. } => NodeLabel::Tech,
            GraphNode::Asn(_) => NodeLabel::Asn,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            GraphNode::Host { url, .. } => url,
            GraphNode::Ip { address } => address,
            GraphNode::Tech { name } => name,
            GraphNode::Asn(asn) => &asn.number,
        }
    }
}

/// Node and relationship counts, by label and type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphSummary {
    pub hosts: usize,
    pub ips: usize,
    pub techs: usize,
    pub asns: usize,
    pub resolves_to: usize,
    pub uses: usize,
    pub belongs_to: usize,
}

impl GraphSummary {
    pub fn nodes(&self) -> usize {
        self.hosts + self.ips + self.techs + self.asns
    }

    pub fn relationships(&self) -> usize {
        self.resolves_to + self.uses + self.belongs_to
    }
}

#[derive(Debug, Default)]
pub struct MemoryGraph {
    graph: DiGraph<GraphNode, RelType>,
    index: HashMap<(NodeLabel, String), NodeIndex>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_index(&self, label: NodeLabel, key: &str) -> Option<NodeIndex> {
        self.index.get(&(label, key.to_string())).copied()
    }

    // MERGE semantics: return the existing node for (label, key) or create it.
    fn merge_node(&mut self, label: NodeLabel, key: &str) -> NodeIndex {
        if let Some(idx) = self.node_index(label, key) {
            return idx;
        }
        let node = match label {
            NodeLabel::Host => GraphNode::Host {
                url: key.to_string(),
                props: HostProps::default(),
            },
            NodeLabel::Ip => GraphNode::Ip {
                address: key.to_string(),
            },
            NodeLabel::Tech => GraphNode::Tech {
                name: key.to_string(),
            },
            NodeLabel::Asn => GraphNode::Asn(AsnProps {
                number: key.to_string(),
                ..AsnProps::default()
            }),
        };
        let idx = self.graph.add_node(node);
        self.index.insert((label, key.to_string()), idx);
        idx
    }

    fn ensure_edge(&mut self, from: NodeIndex, to: NodeIndex, rel: RelType) {
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|edge| *edge.weight() == rel);
        if !exists {
            self.graph.add_edge(from, to, rel);
        }
    }

    fn write(&mut self, op: &Upsert) {
        let host = self.merge_node(NodeLabel::Host, op.url());
        match op {
            Upsert::Host { props, .. } => {
                if let GraphNode::Host { props: current, .. } = &mut self.graph[host] {
                    *current = props.clone();
                }
            }
            Upsert::ResolvesTo { address, .. } => {
                let ip = self.merge_node(NodeLabel::Ip, address);
                self.ensure_edge(host, ip, RelType::ResolvesTo);
            }
            Upsert::Uses { tech, .. } => {
                let tech = self.merge_node(NodeLabel::Tech, tech);
                self.ensure_edge(host, tech, RelType::Uses);
            }
            Upsert::BelongsTo { asn, .. } => {
                let idx = self.merge_node(NodeLabel::Asn, &asn.number);
                if let GraphNode::Asn(current) = &mut self.graph[idx] {
                    current.name = asn.name.clone();
                    current.country = asn.country.clone();
                }
                self.ensure_edge(host, idx, RelType::BelongsTo);
            }
        }
    }

    pub fn host(&self, url: &str) -> Option<&HostProps> {
        let idx = self.node_index(NodeLabel::Host, url)?;
        match &self.graph[idx] {
            GraphNode::Host { props, .. } => Some(props),
            _ => None,
        }
    }

    pub fn asn(&self, number: &str) -> Option<&AsnProps> {
        let idx = self.node_index(NodeLabel::Asn, number)?;
        match &self.graph[idx] {
            GraphNode::Asn(asn) => Some(asn),
            _ => None,
        }
    }

    pub fn contains(&self, label: NodeLabel, key: &str) -> bool {
        self.node_index(label, key).is_some()
    }

    pub fn count(&self, label: NodeLabel) -> usize {
        self.graph
            .node_weights()
            .filter(|node| node.label() == label)
            .count()
    }

    pub fn relationship_count(&self, rel: RelType) -> usize {
        self.graph
            .edge_weights()
            .filter(|weight| **weight == rel)
            .count()
    }

    /// Keys of the nodes `url` points at through `rel`, sorted.
    pub fn related(&self, url: &str, rel: RelType) -> Vec<String> {
        let Some(host) = self.node_index(NodeLabel::Host, url) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = self
            .graph
            .edges(host)
            .filter(|edge| *edge.weight() == rel)
            .map(|edge| self.graph[edge.target()].key().to_string())
            .collect();
        keys.sort();
        keys
    }

    /// URLs of every host pointing at (label, key), sorted. This is the
    /// shared-IP / shared-tech / shared-ASN query.
    pub fn hosts_sharing(&self, label: NodeLabel, key: &str) -> Vec<String> {
        let Some(target) = self.node_index(label, key) else {
            return Vec::new();
        };
        let mut urls: Vec<String> = self
            .graph
            .neighbors_directed(target, petgraph::Direction::Incoming)
            .map(|idx| self.graph[idx].key().to_string())
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            hosts: self.count(NodeLabel::Host),
            ips: self.count(NodeLabel::Ip),
            techs: self.count(NodeLabel::Tech),
            asns: self.count(NodeLabel::Asn),
            resolves_to: self.relationship_count(RelType::ResolvesTo),
            uses: self.relationship_count(RelType::Uses),
            belongs_to: self.relationship_count(RelType::BelongsTo),
        }
    }
}

impl GraphStore for MemoryGraph {
    async fn apply(&mut self, plan: &UpsertPlan) -> Result<(), UpsertError> {
        // Empty keys are the only failure here; reject before the first write.
        plan.check_keys()
            .map_err(|(step, source)| UpsertError::new(plan.url(), step, source))?;

        for op in plan.ops() {
            self.write(op);
        }
        debug!(url = plan.url(), steps = plan.len(), "applied upsert plan");
        Ok(())
    }
}
