// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

//! Cactus fixtures shared by the unit tests.

use std::collections::BTreeSet;

use crate::cactus::{Block, Cactus, Group, Net, Node, NodeId};

pub(crate) fn nid(n: u32) -> NodeId {
    NodeId(n)
}

/// A circular chromosome of one block:
///
///   n0 ===== n1
///    \______/
///
/// Segment edge n0 <-> n1 with the given copy-number, one adjacency
/// edge closing the circle. Everything lives in a single net.
pub(crate) fn circle_cactus(copynumber: f64) -> Cactus {
    let nodes = vec![
        Node {
            id: nid(0),
            twin: nid(1),
            partner: nid(1),
        },
        Node {
            id: nid(1),
            twin: nid(0),
            partner: nid(0),
        },
    ];
    let adjacency = vec![(nid(0), nid(1), copynumber)];
    let blocks = vec![Block::new(nid(0), nid(1), 100, vec![copynumber])];
    let groups = vec![Group {
        nodes: vec![nid(0), nid(1)],
    }];
    let nets = vec![Net {
        groups: BTreeSet::from([0]),
    }];
    Cactus::assemble(nodes, adjacency, blocks, groups, nets, 0)
        .expect("Fixture cactus must assemble.")
}

/// A circular chromosome of two blocks, all ends in one net:
///
///   n0 ===== n1 -- n2 ===== n3
///    \______________________/
///
/// Both blocks are net self-loops, so each forms its own chain.
pub(crate) fn circle4_cactus(copynumber: f64) -> Cactus {
    let nodes = vec![
        Node {
            id: nid(0),
            twin: nid(1),
            partner: nid(3),
        },
        Node {
            id: nid(1),
            twin: nid(0),
            partner: nid(2),
        },
        Node {
            id: nid(2),
            twin: nid(3),
            partner: nid(1),
        },
        Node {
            id: nid(3),
            twin: nid(2),
            partner: nid(0),
        },
    ];
    let adjacency = vec![
        (nid(1), nid(2), copynumber),
        (nid(3), nid(0), copynumber),
    ];
    let blocks = vec![
        Block::new(nid(0), nid(1), 100, vec![copynumber]),
        Block::new(nid(2), nid(3), 100, vec![copynumber]),
    ];
    let groups = vec![
        Group {
            nodes: vec![nid(1), nid(2)],
        },
        Group {
            nodes: vec![nid(3), nid(0)],
        },
    ];
    let nets = vec![Net {
        groups: BTreeSet::from([0, 1]),
    }];
    Cactus::assemble(nodes, adjacency, blocks, groups, nets, 0)
        .expect("Fixture cactus must assemble.")
}

/// The same two-block circle, but with the adjacency bundles split
/// into two nets. Block ends cross between the nets, so each net's
/// module sees the far ends as pseudo-telomeres and the two blocks
/// form one chain through both nets.
pub(crate) fn two_net_cactus(copynumber: f64) -> Cactus {
    let nodes = vec![
        Node {
            id: nid(0),
            twin: nid(1),
            partner: nid(3),
        },
        Node {
            id: nid(1),
            twin: nid(0),
            partner: nid(2),
        },
        Node {
            id: nid(2),
            twin: nid(3),
            partner: nid(1),
        },
        Node {
            id: nid(3),
            twin: nid(2),
            partner: nid(0),
        },
    ];
    let adjacency = vec![
        (nid(1), nid(2), copynumber),
        (nid(3), nid(0), copynumber),
    ];
    let blocks = vec![
        Block::new(nid(0), nid(1), 100, vec![copynumber]),
        Block::new(nid(2), nid(3), 100, vec![copynumber]),
    ];
    let groups = vec![
        Group {
            nodes: vec![nid(3), nid(0)],
        },
        Group {
            nodes: vec![nid(1), nid(2)],
        },
    ];
    let nets = vec![
        Net {
            groups: BTreeSet::from([0]),
        },
        Net {
            groups: BTreeSet::from([1]),
        },
    ];
    Cactus::assemble(nodes, adjacency, blocks, groups, nets, 0)
        .expect("Fixture cactus must assemble.")
}

/// A chain of three blocks running through three nets:
///
///   N0 ==B0== N1 ==B1== N2 ==B2== N0
///
/// Copy-numbers at ploidy 2: B0 (4,4), B1 (4,4), B2 (1,1).
pub(crate) fn triple_chain_cactus() -> Cactus {
    let nodes = vec![
        Node {
            id: nid(0),
            twin: nid(1),
            partner: nid(5),
        },
        Node {
            id: nid(1),
            twin: nid(0),
            partner: nid(2),
        },
        Node {
            id: nid(2),
            twin: nid(3),
            partner: nid(1),
        },
        Node {
            id: nid(3),
            twin: nid(2),
            partner: nid(4),
        },
        Node {
            id: nid(4),
            twin: nid(5),
            partner: nid(3),
        },
        Node {
            id: nid(5),
            twin: nid(4),
            partner: nid(0),
        },
    ];
    let adjacency = vec![
        (nid(1), nid(2), 4.0),
        (nid(3), nid(4), 1.0),
        (nid(5), nid(0), 4.0),
    ];
    let blocks = vec![
        Block::new(nid(0), nid(1), 1, vec![4.0, 4.0]),
        Block::new(nid(2), nid(3), 1, vec![4.0, 4.0]),
        Block::new(nid(4), nid(5), 1, vec![1.0, 1.0]),
    ];
    let groups = vec![
        Group {
            nodes: vec![nid(5), nid(0)],
        },
        Group {
            nodes: vec![nid(1), nid(2)],
        },
        Group {
            nodes: vec![nid(3), nid(4)],
        },
    ];
    let nets = vec![
        Net {
            groups: BTreeSet::from([0]),
        },
        Net {
            groups: BTreeSet::from([1]),
        },
        Net {
            groups: BTreeSet::from([2]),
        },
    ];
    Cactus::assemble(nodes, adjacency, blocks, groups, nets, 0)
        .expect("Fixture cactus must assemble.")
}
