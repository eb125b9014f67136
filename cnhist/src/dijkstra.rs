// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use crate::cactus::NodeId;
use crate::module::{AdjacencyEntry, AdjacencyTable, Module, MIN_FLOW};

/// Edges excluded from the search, keyed `(start, finish, index)`.
pub type MissingEdges = HashSet<(NodeId, NodeId, i32)>;

/// Distance pair `(even, odd)` of one node. `-1` marks unreached.
pub type DistanceMap = BTreeMap<NodeId, (i64, i64)>;

fn excluded(entry: &AdjacencyEntry, missing: Option<&MissingEdges>) -> bool {
    match missing {
        Some(missing) => missing.contains(&(entry.0, entry.1, entry.3)),
        None => false,
    }
}

pub fn positive_neighbourhood<'a>(
    table: &'a AdjacencyTable,
    node: NodeId,
    missing: Option<&'a MissingEdges>,
) -> impl Iterator<Item = &'a AdjacencyEntry> {
    table
        .node_entries(node)
        .iter()
        .filter(move |entry| entry.2 > MIN_FLOW && !excluded(entry, missing))
}

pub fn negative_neighbourhood<'a>(
    table: &'a AdjacencyTable,
    node: NodeId,
    missing: Option<&'a MissingEdges>,
) -> impl Iterator<Item = &'a AdjacencyEntry> {
    table
        .node_entries(node)
        .iter()
        .filter(move |entry| entry.2 < -MIN_FLOW && !excluded(entry, missing))
}

/// Partners reachable over a residual of the same sign as [value].
pub fn phased_neighbourhood(
    table: &AdjacencyTable,
    node: NodeId,
    value: f64,
    missing: Option<&MissingEdges>,
) -> Vec<NodeId> {
    if value > 0.0 {
        positive_neighbourhood(table, node, missing)
            .map(|entry| entry.1)
            .collect()
    } else {
        negative_neighbourhood(table, node, missing)
            .map(|entry| entry.1)
            .collect()
    }
}

/// Partners reachable over a residual of the opposite sign of [value].
pub fn opposite_neighbourhood(
    table: &AdjacencyTable,
    node: NodeId,
    value: f64,
    missing: Option<&MissingEdges>,
) -> Vec<NodeId> {
    if value > 0.0 {
        negative_neighbourhood(table, node, missing)
            .map(|entry| entry.1)
            .collect()
    } else {
        positive_neighbourhood(table, node, missing)
            .map(|entry| entry.1)
            .collect()
    }
}

/// Min-heap with lazy decrease-key.
///
/// Entries carry `(distance, counter, node)`; the insertion counter
/// breaks distance ties first-in-first-out. A decrease-key pushes a
/// replacement under the node's original counter and the superseded
/// entry no longer matches the live table, so it is skipped on pop.
struct TodoQueue {
    heap: BinaryHeap<Reverse<(usize, u64, NodeId)>>,
    live: HashMap<NodeId, (usize, u64)>,
    counter: u64,
}

impl TodoQueue {
    fn new() -> TodoQueue {
        TodoQueue {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            counter: 0,
        }
    }

    fn add_node(&mut self, distance: usize, node: NodeId) {
        self.counter += 1;
        self.live.insert(node, (distance, self.counter));
        self.heap.push(Reverse((distance, self.counter, node)));
    }

    fn redistance_node(&mut self, distance: usize, node: NodeId) {
        let count = match self.live.get(&node) {
            Some((_, count)) => *count,
            None => panic!("Redistanced node {} which is not queued.", node),
        };
        self.live.insert(node, (distance, count));
        self.heap.push(Reverse((distance, count, node)));
    }

    fn next_node(&mut self) -> Option<(usize, NodeId)> {
        while let Some(Reverse((distance, count, node))) = self.heap.pop() {
            if self.live.get(&node) == Some(&(distance, count)) {
                self.live.remove(&node);
                return Some((distance, node));
            }
        }
        None
    }
}

const UNVISITED: u8 = 0;
const QUEUED: u8 = 1;
const SETTLED: u8 = 2;

/// Shortest even-length alternating paths from [origin].
///
/// The first hop leaves over the opposite-signed neighbourhood, the
/// second over the same-signed one, and only every second node gets a
/// distance. Stepping back into the origin is forbidden so the search
/// measures proper cycles.
pub fn compute_even_distances(
    origin: NodeId,
    value: f64,
    module: &Module,
    table: &AdjacencyTable,
    missing: Option<&MissingEdges>,
) -> BTreeMap<NodeId, i64> {
    let mut distances: BTreeMap<NodeId, i64> = module.nodes().map(|n| (n, -1)).collect();
    let mut status: BTreeMap<NodeId, u8> = module.nodes().map(|n| (n, UNVISITED)).collect();
    let mut steps: HashSet<NodeId> = HashSet::new();
    let mut todo = TodoQueue::new();

    todo.add_node(0, origin);
    distances.insert(origin, 0);
    while let Some((dist, node)) = todo.next_node() {
        status.insert(node, SETTLED);
        for node2 in opposite_neighbourhood(table, node, value, missing) {
            if steps.contains(&node2) {
                continue;
            }
            steps.insert(node2);
            for node3 in phased_neighbourhood(table, node2, value, missing) {
                if node3 == origin {
                    continue;
                }
                let newdist = dist + 1;
                match status[&node3] {
                    SETTLED => continue,
                    QUEUED if (newdist as i64) < distances[&node3] => {
                        todo.redistance_node(newdist, node3);
                        distances.insert(node3, newdist as i64);
                    }
                    UNVISITED => {
                        status.insert(node3, QUEUED);
                        distances.insert(node3, newdist as i64);
                        todo.add_node(newdist, node3);
                    }
                    _ => (),
                }
            }
        }
    }
    distances
}

/// Shortest odd-length alternating paths from [origin].
///
/// Seeded with the opposite-signed neighbourhood at distance one.
/// [block_twin] excludes the origin's twin from the seed, which keeps
/// small diploid cycles from forming around a single block.
pub fn compute_odd_distances(
    origin: NodeId,
    value: f64,
    module: &Module,
    table: &AdjacencyTable,
    missing: Option<&MissingEdges>,
    block_twin: bool,
) -> BTreeMap<NodeId, i64> {
    let mut distances: BTreeMap<NodeId, i64> = module.nodes().map(|n| (n, -1)).collect();
    let mut status: BTreeMap<NodeId, u8> = module.nodes().map(|n| (n, UNVISITED)).collect();
    let mut steps: HashSet<NodeId> = HashSet::new();
    let mut todo = TodoQueue::new();

    steps.insert(origin);
    for node2 in opposite_neighbourhood(table, origin, value, missing) {
        if status[&node2] > UNVISITED {
            continue;
        }
        if block_twin && node2 == module.twin(origin) {
            continue;
        }
        status.insert(node2, QUEUED);
        distances.insert(node2, 1);
        todo.add_node(1, node2);
    }

    while let Some((dist, node)) = todo.next_node() {
        status.insert(node, SETTLED);
        for node2 in phased_neighbourhood(table, node, value, missing) {
            if steps.contains(&node2) {
                continue;
            }
            steps.insert(node2);
            for node3 in opposite_neighbourhood(table, node2, value, missing) {
                let newdist = dist + 1;
                match status[&node3] {
                    SETTLED => continue,
                    QUEUED if (newdist as i64) < distances[&node3] => {
                        todo.redistance_node(newdist, node3);
                        distances.insert(node3, newdist as i64);
                    }
                    UNVISITED => {
                        status.insert(node3, QUEUED);
                        distances.insert(node3, newdist as i64);
                        todo.add_node(newdist, node3);
                    }
                    _ => (),
                }
            }
        }
    }
    distances
}

/// Both alternating-phase distance maps of [origin] at once.
pub fn dijkstra(
    origin: NodeId,
    value: f64,
    module: &Module,
    table: &AdjacencyTable,
    missing: Option<&MissingEdges>,
    block_twin: bool,
) -> DistanceMap {
    let even = compute_even_distances(origin, value, module, table, missing);
    let odd = compute_odd_distances(origin, value, module, table, missing, block_twin);
    module
        .nodes()
        .map(|node| (node, (even[&node], odd[&node])))
        .collect()
}
