// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::{BTreeMap, BTreeSet};

use helper::set_map::SetMap;

use crate::error::HistoryError;

/// A node identifier. One breakpoint end of a genomic segment.
#[derive(Clone, Copy, Hash, Eq, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn min(a: NodeId, b: NodeId) -> NodeId {
        if a <= b {
            a
        } else {
            b
        }
    }

    pub fn max(a: NodeId, b: NodeId) -> NodeId {
        if a >= b {
            a
        } else {
            b
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == STUB_NODE {
            return write!(f, "n(stub)");
        }
        write!(f, "n{}", self.0)
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// The node absorbing telomeric adjacencies. Open chromosome ends
/// connect here instead of a sequenced partner.
pub const STUB_NODE: NodeId = NodeId(u32::MAX);

pub type BlockId = usize;
pub type ChainId = usize;
pub type GroupId = usize;
pub type NetId = usize;

/// One breakpoint end. Its twin is the other end of the same block,
/// its partner the reference-adjacent end it is glued to.
#[derive(Clone)]
pub struct Node {
    pub id: NodeId,
    pub twin: NodeId,
    pub partner: NodeId,
}

/// An oriented DNA segment: a pair of twin nodes joined by a segment
/// edge, with one observed copy-number per ploidy channel.
#[derive(Clone)]
pub struct Block {
    ends: (NodeId, NodeId),
    length: usize,
    copynumber: Vec<f64>,
}

impl Block {
    pub fn new(end_a: NodeId, end_b: NodeId, length: usize, copynumber: Vec<f64>) -> Block {
        Block {
            ends: (end_a, end_b),
            length,
            copynumber,
        }
    }

    pub fn copynumber(&self, index: usize) -> f64 {
        self.copynumber[index]
    }

    pub fn copynumbers(&self) -> &[f64] {
        &self.copynumber
    }

    pub fn ploidy(&self) -> usize {
        self.copynumber.len()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn nodes(&self) -> [NodeId; 2] {
        [self.ends.0, self.ends.1]
    }
}

/// Maximal alternating sequence of blocks, ordered along their simple
/// cycle in the net graph. Bridge blocks form chains of length one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Chain {
    pub blocks: Vec<BlockId>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A bundle of breakpoint ends connected through adjacency edges.
#[derive(Clone)]
pub struct Group {
    pub nodes: Vec<NodeId>,
}

/// An equivalence class of connected groups.
#[derive(Clone)]
pub struct Net {
    pub groups: BTreeSet<GroupId>,
}

/// The cactus decomposition of an adjacency graph.
///
/// Nodes, adjacency flows, blocks and groups are the primary data; the
/// chain/net structures and the oriented net tree are derived and get
/// recomputed whenever the net partition changes.
#[derive(Clone)]
pub struct Cactus {
    pub nodes: BTreeMap<NodeId, Node>,
    /// Signed adjacency flows, stored symmetrically.
    pub adjacency: BTreeMap<NodeId, BTreeMap<NodeId, f64>>,
    pub blocks: Vec<Block>,
    pub node_block: BTreeMap<NodeId, BlockId>,
    pub groups: Vec<Group>,
    pub node_group: BTreeMap<NodeId, GroupId>,
    pub nets: Vec<Net>,
    pub group_net: BTreeMap<GroupId, NetId>,
    pub chains: Vec<Chain>,
    pub block_chain: BTreeMap<BlockId, ChainId>,
    /// Child chains of a net in the oriented net tree.
    pub nets2chains: SetMap<NetId, ChainId>,
    /// Child nets of a chain in the oriented net tree.
    pub chains2nets: SetMap<ChainId, NetId>,
    pub root_net: NetId,
}

impl Cactus {
    /// Builds a cactus from its primary data and derives all secondary
    /// structures. [nets] partitions the group indices; [root_group]
    /// selects the net the history propagation starts from.
    pub fn assemble(
        nodes: Vec<Node>,
        adjacency: Vec<(NodeId, NodeId, f64)>,
        blocks: Vec<Block>,
        groups: Vec<Group>,
        nets: Vec<Net>,
        root_group: GroupId,
    ) -> Result<Cactus, HistoryError> {
        let mut cactus = Cactus {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            adjacency: BTreeMap::new(),
            blocks,
            node_block: BTreeMap::new(),
            groups,
            node_group: BTreeMap::new(),
            nets,
            group_net: BTreeMap::new(),
            chains: Vec::new(),
            block_chain: BTreeMap::new(),
            nets2chains: SetMap::new(),
            chains2nets: SetMap::new(),
            root_net: 0,
        };
        for (a, b, flow) in adjacency {
            cactus.set_adjacency(a, b, flow);
        }
        for (bid, block) in cactus.blocks.iter().enumerate() {
            for node in block.nodes() {
                cactus.node_block.insert(node, bid);
            }
        }
        for (gid, group) in cactus.groups.iter().enumerate() {
            for node in group.nodes.iter() {
                cactus.node_group.insert(*node, gid);
            }
        }
        cactus.rebuild_net_maps();
        cactus.root_net = *cactus
            .group_net
            .get(&root_group)
            .ok_or_else(|| HistoryError::structural("root group belongs to no net", ""))?;
        cactus.compute_chains();
        cactus.rebuild_tree();
        cactus.check_block_coverage()?;
        Ok(cactus)
    }

    pub fn set_adjacency(&mut self, a: NodeId, b: NodeId, flow: f64) {
        self.adjacency.entry(a).or_default().insert(b, flow);
        if a != b {
            self.adjacency.entry(b).or_default().insert(a, flow);
        }
    }

    pub fn twin(&self, node: NodeId) -> NodeId {
        self.nodes[&node].twin
    }

    pub fn partner(&self, node: NodeId) -> NodeId {
        self.nodes[&node].partner
    }

    pub fn node_net(&self, node: NodeId) -> NetId {
        self.group_net[&self.node_group[&node]]
    }

    /// All breakpoint ends of a net, in id order.
    pub fn net_nodes(&self, net: NetId) -> BTreeSet<NodeId> {
        let mut nodes = BTreeSet::new();
        for gid in self.nets[net].groups.iter() {
            nodes.extend(self.groups[*gid].nodes.iter().copied());
        }
        nodes
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn chain(&self, id: ChainId) -> &Chain {
        &self.chains[id]
    }

    pub fn net_ids(&self) -> std::ops::Range<NetId> {
        0..self.nets.len()
    }

    /// The nets a block's two ends lie in.
    fn block_nets(&self, id: BlockId) -> (NetId, NetId) {
        let [a, b] = self.blocks[id].nodes();
        (self.node_net(a), self.node_net(b))
    }

    pub fn rebuild_net_maps(&mut self) {
        self.group_net.clear();
        for (nid, net) in self.nets.iter().enumerate() {
            for gid in net.groups.iter() {
                self.group_net.insert(*gid, nid);
            }
        }
    }

    /// Recomputes the chain partition from the current net partition.
    ///
    /// Uses the cactus property: every block lies on at most one simple
    /// cycle of the net graph. Cycles are recovered from a DFS spanning
    /// tree, one per back edge; tree edges left on no cycle become
    /// singleton chains.
    pub fn compute_chains(&mut self) {
        // Net-level multigraph: vertices are nets, edges are blocks.
        let mut incidence: BTreeMap<NetId, Vec<(NetId, BlockId)>> = BTreeMap::new();
        let mut self_loops: Vec<BlockId> = Vec::new();
        for bid in 0..self.blocks.len() {
            let (na, nb) = self.block_nets(bid);
            if na == nb {
                self_loops.push(bid);
                continue;
            }
            incidence.entry(na).or_default().push((nb, bid));
            incidence.entry(nb).or_default().push((na, bid));
        }
        for edges in incidence.values_mut() {
            edges.sort();
        }

        let mut chains: Vec<Chain> = self_loops
            .into_iter()
            .map(|bid| Chain { blocks: vec![bid] })
            .collect();

        // Depth-first spanning tree. The traversal expands one neighbor
        // at a time so every non-tree edge points to an ancestor.
        // parent_edge[v] = (parent net, entering block).
        let mut visited: BTreeSet<NetId> = BTreeSet::new();
        let mut depth: BTreeMap<NetId, usize> = BTreeMap::new();
        let mut parent_edge: BTreeMap<NetId, (NetId, BlockId)> = BTreeMap::new();
        let mut on_cycle: BTreeSet<BlockId> = BTreeSet::new();
        let mut back_edges: Vec<(NetId, NetId, BlockId)> = Vec::new();
        let roots: Vec<NetId> = incidence.keys().copied().collect();
        for root in roots {
            if visited.contains(&root) {
                continue;
            }
            visited.insert(root);
            depth.insert(root, 0);
            let mut stack: Vec<(NetId, usize)> = vec![(root, 0)];
            while let Some((net, cursor)) = stack.pop() {
                let Some(&(neighbor, bid)) =
                    incidence.get(&net).and_then(|edges| edges.get(cursor))
                else {
                    continue;
                };
                stack.push((net, cursor + 1));
                if parent_edge.get(&net).map(|(_, b)| *b) == Some(bid) {
                    continue;
                }
                if !visited.contains(&neighbor) {
                    visited.insert(neighbor);
                    depth.insert(neighbor, depth[&net] + 1);
                    parent_edge.insert(neighbor, (net, bid));
                    stack.push((neighbor, 0));
                } else if depth[&neighbor] < depth[&net] && !on_cycle.contains(&bid) {
                    // Back edge towards an ancestor: one simple cycle.
                    back_edges.push((net, neighbor, bid));
                    on_cycle.insert(bid);
                }
            }
        }
        for (from, ancestor, back_block) in back_edges {
            let mut path = Vec::new();
            let mut cursor = from;
            while cursor != ancestor {
                let (parent, bid) = parent_edge[&cursor];
                path.push(bid);
                on_cycle.insert(bid);
                cursor = parent;
            }
            // Walk the cycle from the ancestor down the tree path, then
            // close it over the back edge.
            path.reverse();
            path.push(back_block);
            chains.push(Chain { blocks: path });
        }
        // Bridges: tree edges on no cycle.
        for (_, (_, bid)) in parent_edge.iter() {
            if !on_cycle.contains(bid) {
                chains.push(Chain { blocks: vec![*bid] });
            }
        }

        chains.sort_by_key(|c| c.blocks.iter().min().copied());
        self.chains = chains;
        self.block_chain.clear();
        for (cid, chain) in self.chains.iter().enumerate() {
            for bid in chain.blocks.iter() {
                self.block_chain.insert(*bid, cid);
            }
        }
    }

    /// Orients the net tree away from the root net. Fills
    /// [Self::nets2chains] (child chains) and [Self::chains2nets]
    /// (child nets).
    pub fn rebuild_tree(&mut self) {
        let mut chain_nets: BTreeMap<ChainId, BTreeSet<NetId>> = BTreeMap::new();
        let mut net_chains: BTreeMap<NetId, BTreeSet<ChainId>> = BTreeMap::new();
        for (cid, chain) in self.chains.iter().enumerate() {
            for bid in chain.blocks.iter() {
                let (na, nb) = self.block_nets(*bid);
                chain_nets.entry(cid).or_default().extend([na, nb]);
                net_chains.entry(na).or_default().insert(cid);
                net_chains.entry(nb).or_default().insert(cid);
            }
        }

        self.nets2chains.clear();
        self.chains2nets.clear();
        let mut seen_nets = BTreeSet::from([self.root_net]);
        let mut seen_chains = BTreeSet::new();
        let mut queue = std::collections::VecDeque::from([self.root_net]);
        while let Some(net) = queue.pop_front() {
            for cid in net_chains.get(&net).into_iter().flatten() {
                if !seen_chains.insert(*cid) {
                    continue;
                }
                self.nets2chains.insert(net, *cid);
                for child in chain_nets[cid].iter() {
                    if seen_nets.insert(*child) {
                        self.chains2nets.insert(*cid, *child);
                        queue.push_back(*child);
                    }
                }
            }
        }
    }

    /// Every block assigned to a node must belong to some chain.
    pub fn check_block_coverage(&self) -> Result<(), HistoryError> {
        for bid in self.node_block.values() {
            if !self.block_chain.contains_key(bid) {
                return Err(HistoryError::structural(
                    format!("block {} belongs to no chain", bid),
                    self.dump(),
                ));
            }
        }
        Ok(())
    }

    /// Diagnostic dump of the net and chain structure.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (nid, net) in self.nets.iter().enumerate() {
            out.push_str(&format!("net {}: groups {:?}\n", nid, net.groups));
        }
        for (cid, chain) in self.chains.iter().enumerate() {
            out.push_str(&format!("chain {}: blocks {:?}\n", cid, chain.blocks));
        }
        out
    }
}
