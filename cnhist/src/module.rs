// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::{BTreeMap, BTreeSet};

use helper::vec_map::VecMap;
use petgraph::dot::Dot;
use petgraph::prelude::UnGraphMap;

use crate::cactus::{Cactus, ChainId, NetId, NodeId, STUB_NODE};
use crate::flows::{Edge, ADJACENCY_INDEX};

/// Residuals below this threshold count as zero flow.
pub const MIN_FLOW: f64 = 1e-10;

/// Adjacency residuals of a module. One symmetric weight per node pair.
pub type ResidualGraph = UnGraphMap<NodeId, f64>;

/// The local residual subgraph of one net.
///
/// Cycle extraction mutates the residuals in place until they are
/// exhausted. The twin of a net node whose own net lies elsewhere is
/// included as a pseudo-telomere so the chain flow can be closed off
/// locally.
#[derive(Clone)]
pub struct Module {
    pub net: NetId,
    nodes: BTreeSet<NodeId>,
    pub graph: ResidualGraph,
    /// Signed residual segment flow per node, one entry per ploidy
    /// channel. Twin nodes mirror each other's vector.
    pub segments: BTreeMap<NodeId, Vec<f64>>,
    pub pseudotelomeres: BTreeSet<NodeId>,
    pub stub: NodeId,
    twins: BTreeMap<NodeId, NodeId>,
    partners: BTreeMap<NodeId, NodeId>,
}

impl Module {
    /// Builds the residual subgraph of [net]. Copy-number contributions
    /// already claimed by other nets' histories are handed in through
    /// [chain_cnvs] and subtracted from the segment flows.
    pub fn new(cactus: &Cactus, net: NetId, chain_cnvs: &BTreeMap<ChainId, Vec<f64>>) -> Module {
        let net_nodes = cactus.net_nodes(net);
        let mut module = Module {
            net,
            nodes: BTreeSet::new(),
            graph: ResidualGraph::new(),
            segments: BTreeMap::new(),
            pseudotelomeres: BTreeSet::new(),
            stub: STUB_NODE,
            twins: BTreeMap::new(),
            partners: BTreeMap::new(),
        };
        module.nodes.insert(STUB_NODE);
        module.graph.add_node(STUB_NODE);
        module.segments.insert(STUB_NODE, Vec::new());

        for node in net_nodes.iter().copied() {
            let twin = cactus.twin(node);
            module.nodes.insert(node);
            module.graph.add_node(node);
            module.twins.insert(node, twin);
            module.partners.insert(node, cactus.partner(node));
            if !net_nodes.contains(&twin) {
                module.nodes.insert(twin);
                module.graph.add_node(twin);
                module.twins.insert(twin, node);
                module.pseudotelomeres.insert(twin);
            }
        }
        for node in module.nodes.iter().copied().collect::<Vec<_>>() {
            if node == STUB_NODE {
                continue;
            }
            let block = cactus.block(cactus.node_block[&node]);
            let mut flows = block.copynumbers().to_vec();
            let chain = cactus.block_chain[&cactus.node_block[&node]];
            if let Some(cnvs) = chain_cnvs.get(&chain) {
                for (flow, cnv) in flows.iter_mut().zip(cnvs.iter()) {
                    *flow -= cnv;
                }
            }
            module.segments.insert(node, flows);
        }
        // Adjacency residuals. All partners of a net node live in the
        // net as well, except for telomeric ends glued to the stub.
        for node in net_nodes.iter().copied() {
            for (partner, flow) in cactus.adjacency.get(&node).into_iter().flatten() {
                if module.nodes.contains(partner) {
                    module.graph.add_edge(node, *partner, *flow);
                }
            }
        }
        // Boundary pseudo-adjacencies. A chain crossing the net enters
        // and leaves over two blocks; their far ends are paired up so
        // the closure walk can return over the condensed far side of
        // the chain. The pseudo residual is the total segment flow the
        // chain still transports.
        let mut chain_pts: BTreeMap<ChainId, Vec<NodeId>> = BTreeMap::new();
        for pt in module.pseudotelomeres.iter().copied() {
            let chain = cactus.block_chain[&cactus.node_block[&pt]];
            chain_pts.entry(chain).or_default().push(pt);
        }
        for pts in chain_pts.values() {
            let flow: f64 = module.segments[&pts[0]].iter().sum();
            if pts.len() == 2 {
                module.partners.insert(pts[0], pts[1]);
                module.partners.insert(pts[1], pts[0]);
                module.graph.add_edge(pts[0], pts[1], flow);
            } else {
                // Bridge chains end in the outside world.
                for pt in pts.iter().copied() {
                    module.partners.insert(pt, STUB_NODE);
                    module.graph.add_edge(pt, STUB_NODE, flow);
                }
            }
        }
        module
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn twin(&self, node: NodeId) -> NodeId {
        match self.twins.get(&node) {
            Some(twin) => *twin,
            None => panic!("Node {} has no twin in module {}.", node, self.net),
        }
    }

    pub fn partner(&self, node: NodeId) -> NodeId {
        match self.partners.get(&node) {
            Some(partner) => *partner,
            None => panic!("Node {} has no partner in module {}.", node, self.net),
        }
    }

    /// Current adjacency residual between two nodes. Zero if they are
    /// not adjacent.
    pub fn residual(&self, a: NodeId, b: NodeId) -> f64 {
        self.graph.edge_weight(a, b).copied().unwrap_or(0.0)
    }

    pub fn segment_residual(&self, node: NodeId, index: usize) -> f64 {
        self.segments[&node][index]
    }

    pub fn segment_count(&self, node: NodeId) -> usize {
        self.segments.get(&node).map(Vec::len).unwrap_or(0)
    }

    /// Subtracts the edge's flow from the residual it runs over.
    ///
    /// Adjacency residuals are symmetric, so one weight covers both
    /// directions. Segment residuals are mirrored on both block ends;
    /// the adjacency table stores them sign-inverted, which is why the
    /// value is added here.
    pub fn remove_edge_flow(&mut self, edge: &Edge) {
        if edge.is_adjacency() {
            match self.graph.edge_weight_mut(edge.start, edge.finish) {
                Some(weight) => *weight -= edge.value,
                None => panic!(
                    "Removed flow over a non-existent adjacency {} in module {}.",
                    edge, self.net
                ),
            }
            return;
        }
        let index = edge.index as usize;
        match self.segments.get_mut(&edge.start) {
            Some(flows) => flows[index] += edge.value,
            None => panic!(
                "Removed flow over a non-existent segment {} in module {}.",
                edge, self.net
            ),
        }
        if edge.finish != edge.start {
            if let Some(flows) = self.segments.get_mut(&edge.finish) {
                flows[index] += edge.value;
            }
        }
    }

    /// Diagnostic dump used in structural violation reports.
    pub fn dump(&self) -> String {
        let mut out = format!("module of net {}\n{}", self.net, Dot::new(&self.graph));
        for (node, flows) in self.segments.iter() {
            out.push_str(&format!("segments[{}] = {:?}\n", node, flows));
        }
        out.push_str(&format!("pseudotelomeres: {:?}\n", self.pseudotelomeres));
        out
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dump())
    }
}

/// One signed residual listing: `(start, finish, residual, index)`.
pub type AdjacencyEntry = (NodeId, NodeId, f64, i32);

/// Per-node signed adjacency listings of a module.
///
/// The stored residuals are a snapshot. They go stale as flow is
/// removed during an extraction; [real_value] rereads the live residual
/// and the extractor recomputes the whole table between cycles.
pub struct AdjacencyTable {
    table: VecMap<NodeId, AdjacencyEntry>,
}

impl AdjacencyTable {
    pub fn compute(module: &Module) -> AdjacencyTable {
        let mut table = VecMap::new();
        for node in module.nodes() {
            let mut adjacencies: Vec<AdjacencyEntry> = module
                .graph
                .edges(node)
                .map(|(_, partner, flow)| (node, partner, *flow, ADJACENCY_INDEX))
                .collect();
            adjacencies.sort_by_key(|entry| entry.1);
            table.extend(node, adjacencies);
            for (k, flow) in module.segments[&node].iter().enumerate() {
                table.push(node, (node, module.twin(node), -flow, k as i32));
            }
        }
        AdjacencyTable { table }
    }

    pub fn node_entries(&self, node: NodeId) -> &[AdjacencyEntry] {
        self.table.get(&node)
    }

    /// Every entry of every node, in node order.
    pub fn entries(&self) -> impl Iterator<Item = &AdjacencyEntry> {
        self.table.cell_iter()
    }
}

/// The residual an adjacency table entry currently stands for.
pub fn real_value(entry: &AdjacencyEntry, module: &Module) -> f64 {
    if entry.3 == ADJACENCY_INDEX {
        module.residual(entry.0, entry.1)
    } else {
        -module.segment_residual(entry.0, entry.3 as usize)
    }
}
