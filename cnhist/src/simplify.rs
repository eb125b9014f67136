// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;

use crate::cactus::NodeId;
use crate::flows::{Cycle, Event};

/// A pair of cycle positions walking the same underlying graph edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct SelfOverlap {
    local_cut: usize,
    remote_cut: usize,
}

/// All self-overlaps of a cycle, found by sorting the canonical
/// `(min, max, index)` triples and scanning adjacent pairs.
fn cycle_self_overlaps(cycle: &Cycle) -> Vec<SelfOverlap> {
    let mut indexes: Vec<((NodeId, NodeId, i32), usize)> = cycle
        .iter()
        .enumerate()
        .map(|(pos, edge)| (edge.adjacency_index(), pos))
        .collect();
    indexes.sort();
    let mut overlaps = Vec::new();
    for pair in indexes.windows(2) {
        if pair[0].0 == pair[1].0 {
            overlaps.push(SelfOverlap {
                local_cut: usize::min(pair[0].1, pair[1].1),
                remote_cut: usize::max(pair[0].1, pair[1].1),
            });
        }
    }
    overlaps
}

//////////////////////////////////////////
// Hairpins
//////////////////////////////////////////

fn detect_hairpin(event: &Event) -> Option<usize> {
    let cycle = &event.cycle;
    if cycle.is_empty() {
        return None;
    }
    (0..cycle.len()).find(|index| cycle.at(*index).is_inverse_of(cycle.at(index + 1)))
}

/// How far the mirror property extends outwards around the hairpin tip.
fn hairpin_length(cycle: &Cycle, index: usize) -> usize {
    let n = cycle.len();
    for length in 1..(n / 2) {
        let edge1 = cycle.at((index + n - length) % n);
        let edge2 = cycle.at(index + 1 + length);
        if !edge1.is_inverse_of(edge2) {
            return length;
        }
    }
    n / 2
}

/// Rotates the cycle behind the hairpin tip and trims the mirrored
/// flanks. A hairpin spanning the whole cycle absorbs it entirely.
fn fix_hairpin(event: &Event, index: usize) -> Vec<Event> {
    let cycle = &event.cycle;
    let n = cycle.len();
    let length = hairpin_length(cycle, index);
    if length >= n / 2 {
        return Vec::new();
    }
    let rotated = cycle.start_at((index + 1) % n);
    let trimmed = rotated.sub_cycle(length, n - length);
    debug_assert!(trimmed.is_closed_walk());
    vec![Event::new(trimmed)]
}

fn remove_events_hairpins(events: Vec<Event>) -> Vec<Event> {
    let mut res = Vec::new();
    let mut todo: VecDeque<Event> = events.into();
    while let Some(event) = todo.pop_front() {
        match detect_hairpin(&event) {
            None => res.push(event),
            Some(index) => {
                for fixed in fix_hairpin(&event, index).into_iter().rev() {
                    todo.push_front(fixed);
                }
            }
        }
    }
    res
}

//////////////////////////////////////////
// Repeat boundaries
//////////////////////////////////////////

// The four walks bound the maximal run of matching edges around a
// repeated edge pair. Direct repeats match start-to-start and
// finish-to-finish, reverse repeats match crosswise. All walks stop
// before wrapping onto their own anchor.

fn get_start_of_direct_repeat(
    cycle: &Cycle,
    start1: usize,
    start2: usize,
) -> (usize, usize) {
    let n = cycle.len();
    let (mut pos1, mut pos2) = (start1, start2);
    loop {
        let next1 = (pos1 + n - 1) % n;
        let next2 = (pos2 + n - 1) % n;
        if next1 == start1
            || next2 == start2
            || cycle[next1].start != cycle[next2].start
            || cycle[next1].index != cycle[next2].index
        {
            return (pos1, pos2);
        }
        pos1 = next1;
        pos2 = next2;
    }
}

fn get_end_of_direct_repeat(cycle: &Cycle, start1: usize, start2: usize) -> (usize, usize) {
    let n = cycle.len();
    let (mut pos1, mut pos2) = (start1, start2);
    loop {
        let next1 = (pos1 + 1) % n;
        let next2 = (pos2 + 1) % n;
        if next1 == start1
            || next2 == start2
            || cycle[next1].finish != cycle[next2].finish
            || cycle[next1].index != cycle[next2].index
        {
            return (pos1, pos2);
        }
        pos1 = next1;
        pos2 = next2;
    }
}

fn get_start_of_reverse_repeat(cycle: &Cycle, start1: usize, start2: usize) -> (usize, usize) {
    let n = cycle.len();
    let (mut pos1, mut pos2) = (start1, start2);
    loop {
        let next1 = (pos1 + n - 1) % n;
        let next2 = (pos2 + 1) % n;
        if next1 == start1
            || next2 == start2
            || cycle[next1].start != cycle[next2].finish
            || cycle[next1].index != cycle[next2].index
        {
            return (pos1, pos2);
        }
        pos1 = next1;
        pos2 = next2;
    }
}

fn get_end_of_reverse_repeat(cycle: &Cycle, start1: usize, start2: usize) -> (usize, usize) {
    let n = cycle.len();
    let (mut pos1, mut pos2) = (start1, start2);
    loop {
        let next1 = (pos1 + 1) % n;
        let next2 = (pos2 + n - 1) % n;
        if next1 == start1
            || next2 == start2
            || cycle[next1].finish != cycle[next2].start
            || cycle[next1].index != cycle[next2].index
        {
            return (pos1, pos2);
        }
        pos1 = next1;
        pos2 = next2;
    }
}

//////////////////////////////////////////
// Destructive overlaps
//////////////////////////////////////////

fn event_from_slice(edges: &[crate::flows::Edge]) -> Vec<Event> {
    if edges.is_empty() {
        // Fully cancelled flow. The residual is considered absorbed.
        return Vec::new();
    }
    vec![Event::new(Cycle::new(edges.to_vec()))]
}

fn split_direct_redundancy(cycle: &Cycle, split: SelfOverlap) -> Vec<Event> {
    let n = cycle.len();
    let (a1, a2) = get_start_of_direct_repeat(cycle, split.local_cut, split.remote_cut);
    if (a1 + n - 1) % n == split.local_cut {
        // Double hairpin loop.
        return Vec::new();
    }
    let (b1, b2) = get_end_of_direct_repeat(cycle, split.local_cut, split.remote_cut);
    let cycle = cycle.start_at(a1);
    let a2 = (a2 + n - a1) % n;
    let b1 = (b1 + n - a1) % n;
    let b2 = (b2 + n - a1) % n;
    if b1 + 1 < a2 && b2 + 1 < n {
        let joined = Cycle::new(cycle.edges()[b1 + 1..a2].to_vec())
            .concat(Cycle::new(cycle.edges()[b2 + 1..].to_vec()).reversed());
        return vec![Event::new(joined)];
    } else if b1 + 1 >= a2 {
        // Tandem repeat: the copies lie back to back.
        if 2 * a2 >= n {
            return Vec::new();
        }
        return event_from_slice(&cycle.edges()[2 * a2..]);
    }
    // Symmetrical oddball.
    let cycle = cycle.start_at(a2);
    let a1 = (n - a2) % n;
    if 2 * a1 >= n {
        return Vec::new();
    }
    event_from_slice(&cycle.edges()[2 * a1..])
}

fn split_reverse_redundancy(cycle: &Cycle, split: SelfOverlap) -> Vec<Event> {
    let n = cycle.len();
    let (a1, a2) = get_start_of_reverse_repeat(cycle, split.local_cut, split.remote_cut);
    if (a1 + n - 1) % n == split.local_cut {
        // Double hairpin loop.
        return Vec::new();
    }
    let (b1, b2) = get_end_of_reverse_repeat(cycle, split.local_cut, split.remote_cut);
    let cycle = cycle.start_at(a1);
    let a2 = (a2 + n - a1) % n;
    let b1 = (b1 + n - a1) % n;
    let b2 = (b2 + n - a1) % n;

    if b2 == 0 && a2 == b1 {
        // Tandem duplication passage.
        return event_from_slice(&cycle.edges()[b1 + 1..]);
    }
    if b1 + 1 >= b2 || a2 + 1 >= n {
        // Degenerate layout; the cut positions crossed over. Dropping
        // the cycle absorbs the cancelled flow.
        return Vec::new();
    }
    let mut events = event_from_slice(&cycle.edges()[b1 + 1..b2]);
    events.extend(event_from_slice(&cycle.edges()[a2 + 1..]));
    events
}

fn split_redundancy(cycle: &Cycle, split: SelfOverlap) -> Vec<Event> {
    if cycle[split.local_cut].start == cycle[split.remote_cut].start {
        split_direct_redundancy(cycle, split)
    } else {
        split_reverse_redundancy(cycle, split)
    }
}

fn detect_redundancy(event: &Event) -> Option<SelfOverlap> {
    cycle_self_overlaps(&event.cycle)
        .into_iter()
        .find(|split| {
            event.cycle[split.local_cut].value == -event.cycle[split.remote_cut].value
        })
}

fn split_events_redundancies(events: Vec<Event>) -> Vec<Event> {
    let mut res = Vec::new();
    let mut todo: VecDeque<Event> = events.into();
    while let Some(event) = todo.pop_front() {
        match detect_redundancy(&event) {
            None => res.push(event),
            Some(split) => {
                for piece in split_redundancy(&event.cycle, split).into_iter().rev() {
                    todo.push_front(piece);
                }
            }
        }
    }
    res
}

//////////////////////////////////////////
// Even overlaps
//////////////////////////////////////////

fn get_even_overlap_indices(cycle: &Cycle) -> Vec<SelfOverlap> {
    cycle_self_overlaps(cycle)
        .into_iter()
        .filter(|split| cycle[split.local_cut].start == cycle[split.remote_cut].start)
        .collect()
}

/// Splits the cycle at the knot into two independent events.
fn break_even_overlap(event: &Event, knot: SelfOverlap) -> Vec<Event> {
    let cycle = &event.cycle;
    let mut outer = cycle.edges()[knot.remote_cut..].to_vec();
    outer.extend_from_slice(&cycle.edges()[..knot.local_cut]);
    vec![
        Event::new(Cycle::new(
            cycle.edges()[knot.local_cut..knot.remote_cut].to_vec(),
        )),
        Event::new(Cycle::new(outer)),
    ]
}

fn break_even_overlaps(events: Vec<Event>, rng: &mut StdRng) -> Vec<Event> {
    let mut res = Vec::new();
    let mut todo: VecDeque<Event> = events.into();
    while let Some(event) = todo.pop_front() {
        let overlaps = get_even_overlap_indices(&event.cycle);
        if overlaps.is_empty() {
            res.push(event);
            continue;
        }
        let knot = overlaps[rng.gen_range(0..overlaps.len())];
        for piece in break_even_overlap(&event, knot).into_iter().rev() {
            if !piece.cycle.is_empty() {
                todo.push_front(piece);
            }
        }
    }
    res
}

//////////////////////////////////////////
// Master function
//////////////////////////////////////////

/// Canonicalizes a list of events: hairpin removal, then destructive
/// redundancy splits, then even-overlap breaks. Every rule strictly
/// reduces the overlap count, each recursing on its own outputs.
pub fn simplify_event_cycles(events: Vec<Event>, rng: &mut StdRng) -> Vec<Event> {
    break_even_overlaps(
        split_events_redundancies(remove_events_hairpins(events)),
        rng,
    )
}
