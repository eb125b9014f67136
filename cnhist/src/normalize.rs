// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::{BTreeMap, BTreeSet};

use helper::choice::{cumulative_pick, total_weight};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use crate::cactus::{BlockId, Cactus, Net, NetId};
use crate::error::HistoryError;

/// A contiguous run of chain blocks proposed for pinching.
pub type Segment = Vec<BlockId>;

/// Length-weighted mean copy-number of a block run at one ploidy index.
pub fn chain_mean(cactus: &Cactus, blocks: &[BlockId], index: usize) -> f64 {
    let total: usize = blocks.iter().map(|b| cactus.block(*b).length()).sum();
    let weighted: f64 = blocks
        .iter()
        .map(|b| cactus.block(*b).copynumber(index) * cactus.block(*b).length() as f64)
        .sum();
    weighted / total as f64
}

/// The mean-gap test: the two runs must differ by more than 10% of the
/// smaller mean, and every segment block must sit closer to its own
/// mean than to the complement's.
fn mean_gap_test(cactus: &Cactus, segment: &[BlockId], rest: &[BlockId], index: usize) -> bool {
    let mean_a = chain_mean(cactus, segment, index);
    let mean_b = chain_mean(cactus, rest, index);
    if (mean_a - mean_b).abs() <= 0.1 * f64::min(mean_a.abs(), mean_b.abs()) {
        return false;
    }
    segment.iter().all(|b| {
        let cn = cactus.block(*b).copynumber(index);
        (mean_a - cn).abs() < (mean_b - cn).abs()
    })
}

fn chain_is_ploidy_determined(cactus: &Cactus, blocks: &[BlockId]) -> bool {
    let ploidy = cactus.block(blocks[0]).ploidy();
    blocks.iter().all(|b| cactus.block(*b).ploidy() == ploidy)
}

/// Evaluates one candidate segment `chain[index_a..index_b]`.
///
/// Segments of chains with mixed ploidy qualify as soon as the segment
/// itself runs at a single ploidy; once the chain is ploidy-determined
/// the mean-gap test gates at every ploidy index. Qualifying segments
/// weigh `exp(len)`, so long segments dominate the pinch choice.
fn test_segment(
    cactus: &Cactus,
    chain: &[BlockId],
    index_a: usize,
    index_b: usize,
) -> Option<(f64, Segment)> {
    let ploidy = cactus.block(chain[index_a]).ploidy();
    if !chain[index_a..index_b]
        .iter()
        .all(|b| cactus.block(*b).ploidy() == ploidy)
    {
        return None;
    }
    let segment = &chain[index_a..index_b];
    let mut rest: Vec<BlockId> = chain[index_b..].to_vec();
    rest.extend_from_slice(&chain[..index_a]);
    if rest.is_empty() {
        return None;
    }
    if chain_is_ploidy_determined(cactus, chain)
        && !(0..ploidy).all(|index| mean_gap_test(cactus, segment, &rest, index))
    {
        return None;
    }
    let length = index_b - index_a;
    Some(((length as f64).exp(), segment.to_vec()))
}

fn cutpoints(cactus: &Cactus, chain: &[BlockId]) -> Vec<(f64, Segment)> {
    let mut candidates = Vec::new();
    for index_b in 1..=chain.len() {
        for index_a in 0..index_b {
            if let Some(candidate) = test_segment(cactus, chain, index_a, index_b) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

fn chain_is_unnormalized(cactus: &Cactus, chain: &[BlockId]) -> Vec<(f64, Segment)> {
    if chain.len() > 1 {
        cutpoints(cactus, chain)
    } else {
        Vec::new()
    }
}

/// All qualifying segments of all chains, with their weights.
pub fn unnormalized_chains(cactus: &Cactus) -> Vec<(f64, Segment)> {
    let mut candidates = Vec::new();
    for chain in cactus.chains.iter() {
        candidates.extend(chain_is_unnormalized(cactus, &chain.blocks));
    }
    candidates
}

/// Weighted random choice by cumulative sums; the first option whose
/// prefix sum reaches the target wins.
pub fn weighted_choice<'a, T>(options: &'a [(f64, T)], rng: &mut StdRng) -> Option<&'a T> {
    let weights: Vec<f64> = options.iter().map(|option| option.0).collect();
    let total = total_weight(&weights);
    if total <= 0.0 {
        return None;
    }
    let target = rng.gen_range(0.0..total);
    cumulative_pick(&weights, target).map(|index| &options[index].1)
}

fn block_end_nets(cactus: &Cactus, block: BlockId) -> BTreeSet<NetId> {
    cactus
        .block(block)
        .nodes()
        .iter()
        .map(|n| cactus.node_net(*n))
        .collect()
}

/// The nets collapsing into one when [segment] is pinched. Interior
/// nets are preserved.
fn merged_nets(cactus: &Cactus, segment: &[BlockId]) -> BTreeSet<NetId> {
    if segment.len() == 1 {
        return block_end_nets(cactus, segment[0]);
    }
    let start_nets = block_end_nets(cactus, segment[0]);
    let end_nets = block_end_nets(cactus, segment[segment.len() - 1]);
    if segment.len() == 2 {
        return start_nets.symmetric_difference(&end_nets).copied().collect();
    }
    let inside_nets: BTreeSet<NetId> = segment[1..segment.len() - 1]
        .iter()
        .flat_map(|b| block_end_nets(cactus, *b))
        .collect();
    start_nets
        .union(&end_nets)
        .filter(|n| !inside_nets.contains(n))
        .copied()
        .collect()
}

/// Collapses the nets around [segment] into a single net and rebuilds
/// the chain partition and the oriented net tree.
pub fn pinch_chain(
    cactus: &mut Cactus,
    segment: &[BlockId],
    merged: &BTreeSet<NetId>,
) -> Result<(), HistoryError> {
    debug!(
        "Pinching segment {:?}, merging nets {:?}.",
        segment, merged
    );
    let mut new_nets = Vec::new();
    let mut net_remap: BTreeMap<NetId, NetId> = BTreeMap::new();
    for (nid, net) in cactus.nets.iter().enumerate() {
        if merged.contains(&nid) {
            continue;
        }
        net_remap.insert(nid, new_nets.len());
        new_nets.push(net.clone());
    }
    let union = Net {
        groups: merged
            .iter()
            .flat_map(|nid| cactus.nets[*nid].groups.iter().copied())
            .collect(),
    };
    let merged_id = new_nets.len();
    for nid in merged.iter() {
        net_remap.insert(*nid, merged_id);
    }
    new_nets.push(union);

    cactus.nets = new_nets;
    cactus.root_net = net_remap[&cactus.root_net];
    cactus.rebuild_net_maps();
    cactus.compute_chains();
    cactus.rebuild_tree();
    cactus.check_block_coverage()
}

/// Pinches qualifying segments until the whole graph is normalized.
/// Each pinch strictly reduces the net count, so the loop terminates.
pub fn normalize(cactus: &mut Cactus, rng: &mut StdRng) -> Result<(), HistoryError> {
    loop {
        let mut candidates = unnormalized_chains(cactus);
        // A segment whose boundary nets all lie inside pinches nothing.
        candidates.retain(|(_, segment)| !merged_nets(cactus, segment).is_empty());
        let Some(segment) = weighted_choice(&candidates, rng).cloned() else {
            return Ok(());
        };
        let merged = merged_nets(cactus, &segment);
        debug!("Pinching {} candidate segments left.", candidates.len());
        pinch_chain(cactus, &segment, &merged)?;
    }
}

//////////////////////////////////////////
// Validation
//////////////////////////////////////////

fn blocks_are_fully_normalized(cactus: &Cactus, chain: &[BlockId]) -> bool {
    let first = cactus.block(chain[0]);
    (0..first.ploidy()).all(|index| {
        chain
            .iter()
            .all(|b| cactus.block(*b).copynumber(index) == first.copynumber(index))
    })
}

/// Every chain runs at one ploidy and carries one copy-number per
/// ploidy index across all of its blocks.
pub fn is_fully_normalized(cactus: &Cactus) -> bool {
    cactus.chains.iter().all(|chain| {
        chain_is_ploidy_determined(cactus, &chain.blocks)
            && blocks_are_fully_normalized(cactus, &chain.blocks)
    })
}
