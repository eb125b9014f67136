// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use crate::cactus::{Cactus, NetId, NodeId};
use crate::dijkstra::{dijkstra, DistanceMap};
use crate::error::HistoryError;
use crate::flows::{Cycle, Edge, Event, ADJACENCY_INDEX};
use crate::history::{CactusHistory, History};
use crate::module::{real_value, AdjacencyEntry, AdjacencyTable, Module, MIN_FLOW};
use crate::simplify::simplify_event_cycles;

/// Events transporting less flow than this are considered noise and
/// dropped from the published history.
pub const MIN_CYCLE_FLOW: f64 = 1e-2;

/// Runaway guard. A module yielding this many events is broken.
const MAX_EVENTS: usize = 10_000;

//////////////////////////////////////////
// Closing off pseudo-telomeres
//////////////////////////////////////////

/// Extends the closure walk until it returns to its starting node.
/// Each step crosses a segment edge to the twin and leaves over the
/// twin's reference adjacency, with the flow of the opening edge.
fn extract_pseudo_telomere_cycle(
    module: &mut Module,
    edges: &mut Vec<Edge>,
) -> Result<(), HistoryError> {
    let guard = 4 * module.nodes().count() + 4;
    loop {
        let first = edges[0].start;
        let last = edges[edges.len() - 1].finish;
        if first == last {
            return Ok(());
        }
        if edges.len() > guard {
            return Err(HistoryError::structural(
                "pseudo-telomere walk does not close",
                module.dump(),
            ));
        }
        let next_node = module.twin(last);
        let edge1 = Edge::new(last, next_node, edges[0].value, 0);
        module.remove_edge_flow(&edge1);
        let following = module.partner(next_node);
        let edge2 = Edge::new(next_node, following, -edges[0].value, ADJACENCY_INDEX);
        module.remove_edge_flow(&edge2);
        edges.push(edge1);
        edges.push(edge2);
    }
}

fn close_pseudo_telomere(
    module: &mut Module,
    history: &mut History,
    pt: NodeId,
    index: usize,
) -> Result<(), HistoryError> {
    let twin = module.twin(pt);
    let flow = module.segment_residual(pt, index);
    let edge1 = Edge::new(pt, twin, -flow, index as i32);
    let edge2 = Edge::new(twin, module.partner(twin), flow, ADJACENCY_INDEX);
    module.remove_edge_flow(&edge1);
    module.remove_edge_flow(&edge2);
    let mut edges = vec![edge1, edge2];
    extract_pseudo_telomere_cycle(module, &mut edges)?;
    history.absorb_event(Event::new(Cycle::new(edges)));
    Ok(())
}

/// Closes the boundary flow of every pseudo-telomere, one random
/// pseudo-telomere at a time, until none is left.
pub fn close_pseudo_telomeres(
    module: &mut Module,
    history: &mut History,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    while !module.pseudotelomeres.is_empty() {
        let pts: Vec<NodeId> = module.pseudotelomeres.iter().copied().collect();
        let pt = pts[rng.gen_range(0..pts.len())];
        for index in 0..module.segment_count(pt) {
            close_pseudo_telomere(module, history, pt, index)?;
        }
        module.pseudotelomeres.remove(&pt);
    }
    Ok(())
}

//////////////////////////////////////////
// Search for the smallest edge
//////////////////////////////////////////

/// The starting edge of the next extraction.
///
/// A stub with exactly one hairpin and one outlet left must split the
/// outlet flow over both, so the outlet is returned halved and turned
/// around. Otherwise the non-loop residual of smallest magnitude wins.
pub fn minimum_edge(module: &Module, table: &AdjacencyTable) -> Option<Edge> {
    let stub_entries = table.node_entries(module.stub);
    let hairpins: Vec<&AdjacencyEntry> =
        stub_entries.iter().filter(|e| e.0 == e.1).collect();
    let outlets: Vec<&AdjacencyEntry> = stub_entries
        .iter()
        .filter(|e| e.0 != e.1 && e.2.abs() > MIN_FLOW)
        .collect();
    if hairpins.len() == 1 && outlets.len() == 1 {
        let res = outlets[0];
        return Some(Edge::new(res.1, res.0, res.2 / 2.0, res.3));
    }

    // First minimum wins among equal magnitudes.
    let mut best: Option<&AdjacencyEntry> = None;
    for entry in table.entries().filter(|e| e.0 != e.1 && e.2.abs() > MIN_FLOW) {
        if best.map_or(true, |b| entry.2.abs() < b.2.abs()) {
            best = Some(entry);
        }
    }
    best.map(|res| Edge::new(res.0, res.1, res.2, res.3))
}

//////////////////////////////////////////
// Heuristic walk extension
//////////////////////////////////////////

fn signed_edges<'a>(
    table: &'a AdjacencyTable,
    node: NodeId,
    sign: f64,
) -> impl Iterator<Item = &'a AdjacencyEntry> {
    table
        .node_entries(node)
        .iter()
        .filter(move |e| e.2 * sign > MIN_FLOW)
}

fn entry_distance(entry: &AdjacencyEntry, distances: &DistanceMap, phase: bool) -> i64 {
    let (even, odd) = distances[&entry.1];
    if phase {
        odd
    } else {
        even
    }
}

/// The signed candidate edges closest to closing the cycle; one of the
/// tied minima is drawn uniformly at random.
fn choose_next_node(
    table: &AdjacencyTable,
    node: NodeId,
    distances: &DistanceMap,
    sign: f64,
    phase: bool,
    rng: &mut StdRng,
) -> Option<AdjacencyEntry> {
    let dist = signed_edges(table, node, sign)
        .map(|e| entry_distance(e, distances, phase))
        .filter(|d| *d >= 0)
        .min()?;
    let candidates: Vec<&AdjacencyEntry> = signed_edges(table, node, sign)
        .filter(|e| entry_distance(e, distances, phase) == dist)
        .collect();
    Some(*candidates[rng.gen_range(0..candidates.len())])
}

fn signf(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Extends the cycle edge by edge, phase flipping with every step,
/// until the walk has even length and returns to its starting node.
/// Returns `None` when the residuals ahead are already exhausted.
fn extend_cycle(
    mut cycle: Cycle,
    module: &mut Module,
    table: &AdjacencyTable,
    distances: &DistanceMap,
    mut sign: f64,
    rng: &mut StdRng,
) -> Option<Cycle> {
    loop {
        let node = cycle.last().expect("Cycle starts with one edge.").finish;
        let entry = choose_next_node(
            table,
            node,
            distances,
            signf(cycle.value() * sign),
            sign > 0.0,
            rng,
        )?;
        if real_value(&entry, module).abs() <= MIN_FLOW {
            return None;
        }
        let mut edge = Edge::new(entry.0, entry.1, entry.2, entry.3);
        edge.value = cycle.value() * sign;
        module.remove_edge_flow(&edge);
        cycle.push(edge);

        if cycle.len() % 2 == 0 && edge.finish == cycle[0].start {
            return Some(cycle);
        }
        sign = -sign;
    }
}

fn extract_cycle(
    edge: Edge,
    module: &mut Module,
    table: &AdjacencyTable,
    rng: &mut StdRng,
) -> Option<Event> {
    module.remove_edge_flow(&edge);
    let block_twin = edge.index >= 0;
    let distances = dijkstra(edge.start, edge.value, module, table, None, block_twin);
    extend_cycle(Cycle::new(vec![edge]), module, table, &distances, -1.0, rng).map(Event::new)
}

/// One extraction round. `None` means the module is drained; an inner
/// `None` marks a cycle lost in approximation.
fn pick_out_cycle(module: &mut Module, rng: &mut StdRng) -> Option<Option<Event>> {
    let table = AdjacencyTable::compute(module);
    let edge = minimum_edge(module, &table)?;
    Some(extract_cycle(edge, module, &table, rng))
}

/// Pulls out elementary cycles until every non-loop residual is below
/// [MIN_FLOW].
pub fn pick_out_cycles(
    module: &mut Module,
    history: &mut History,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    while let Some(extraction) = pick_out_cycle(module, rng) {
        let Some(event) = extraction else {
            // Expected: the walk ran into exhausted residuals.
            debug!("Cycle lost in approximation.");
            continue;
        };
        if history.events.len() % 100 == 0 {
            info!("CYCLE {}", history.events.len());
        }
        if history.events.len() > MAX_EVENTS {
            let table = AdjacencyTable::compute(module);
            let minimum = minimum_edge(module, &table);
            return Err(HistoryError::structural(
                "cycle extraction does not converge",
                format!(
                    "{}last event: {}\nminimum edge: {:?}\n",
                    module.dump(),
                    event,
                    minimum
                ),
            ));
        }
        history.absorb_event(event);
    }
    Ok(())
}

//////////////////////////////////////////
// Filtering low flow cycles
//////////////////////////////////////////

/// Canonicalizes the raw events, keeps the high-flow ones (largest
/// ratio first) and publishes the net's CNV contributions.
pub fn high_flow_history(
    raw: History,
    cactus: &Cactus,
    cactus_history: &mut CactusHistory,
    net: NetId,
    rng: &mut StdRng,
) -> History {
    let mut events = simplify_event_cycles(raw.events, rng);
    events.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    let mut res = History::new();
    for event in events {
        if event.ratio > MIN_CYCLE_FLOW {
            res.absorb_event(event);
        } else {
            cactus_history.add_error(event.ratio);
        }
    }
    cactus_history.update(net, res.clone());
    cactus_history.update_cnvs(cactus, net);
    res
}

//////////////////////////////////////////
// Seeding net histories
//////////////////////////////////////////

/// Builds the local history of one net from scratch: close the
/// boundary, pull out cycles, filter, publish.
pub fn seed_history(
    cactus: &Cactus,
    cactus_history: &mut CactusHistory,
    net: NetId,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    let cnvs = cactus_history.chain_cnvs_excluding(net);
    let mut module = Module::new(cactus, net, &cnvs);
    let mut raw = History::new();
    close_pseudo_telomeres(&mut module, &mut raw, rng)?;
    pick_out_cycles(&mut module, &mut raw, rng)?;
    high_flow_history(raw, cactus, cactus_history, net, rng);
    Ok(())
}

fn propagate_initial_history_net(
    cactus: &Cactus,
    history: &mut CactusHistory,
    net: NetId,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    seed_history(cactus, history, net, rng)?;
    for chain in cactus.nets2chains.set_iter(&net) {
        for child in cactus.chains2nets.set_iter(chain) {
            propagate_initial_history_net(cactus, history, *child, rng)?;
        }
    }
    Ok(())
}

/// Seeds every net of the cactus depth-first from the root.
pub fn initial_history(cactus: &Cactus, rng: &mut StdRng) -> Result<CactusHistory, HistoryError> {
    info!("Extracting initial history from cactus graph.");
    let mut history = CactusHistory::new();
    propagate_initial_history_net(cactus, &mut history, cactus.root_net, rng)?;
    Ok(history)
}
