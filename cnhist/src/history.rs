// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::{BTreeMap, BTreeSet};

use crate::cactus::{Cactus, ChainId, NetId};
use crate::flows::Event;

/// The events of one net, in absorption order.
#[derive(Clone, Default)]
pub struct History {
    pub events: Vec<Event>,
}

impl History {
    pub fn new() -> History {
        History { events: Vec::new() }
    }

    pub fn absorb_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Weight of this history in the sampler's net choice. Offset by
    /// one so empty histories stay selectable.
    pub fn density(&self) -> f64 {
        self.events.len() as f64 + 1.0
    }
}

/// A full history of the cactus graph: one local history per net plus
/// the copy-number contributions each chain inherited from them.
#[derive(Clone, Default)]
pub struct CactusHistory {
    pub net_histories: BTreeMap<NetId, History>,
    /// Per-net summands of the chain CNVs. Cached so updating one net
    /// only replaces its own contribution.
    net_chain_contrib: BTreeMap<NetId, BTreeMap<ChainId, Vec<f64>>>,
    pub chain_cnvs: BTreeMap<ChainId, Vec<f64>>,
    /// Flow lost to the low-ratio filter and approximation drops.
    error: f64,
}

impl CactusHistory {
    pub fn new() -> CactusHistory {
        CactusHistory::default()
    }

    /// Replaces the local history of [net].
    pub fn update(&mut self, net: NetId, history: History) {
        self.net_histories.insert(net, history);
    }

    pub fn local_history(&self, net: NetId) -> Option<&History> {
        self.net_histories.get(&net)
    }

    pub fn add_error(&mut self, dropped_flow: f64) {
        self.error += dropped_flow;
    }

    /// Publishes the CNV contributions induced by the local history of
    /// [net] into the chain vectors.
    ///
    /// Segment residuals are drained by adding the edge value, so the
    /// copy-number a traversal explains is the negated edge value. Each
    /// segment edge books that amount on the ploidy channel of the
    /// chain its block lies on; a chain crossing the net is measured at
    /// both incident blocks, so the sum is divided by the number of
    /// touched blocks.
    pub fn update_cnvs(&mut self, cactus: &Cactus, net: NetId) {
        let mut sums: BTreeMap<ChainId, Vec<f64>> = BTreeMap::new();
        let mut touched: BTreeMap<ChainId, BTreeSet<usize>> = BTreeMap::new();
        if let Some(history) = self.net_histories.get(&net) {
            for event in history.events.iter() {
                for edge in event.cycle.iter().filter(|e| e.is_segment()) {
                    let Some(block) = cactus.node_block.get(&edge.start) else {
                        continue;
                    };
                    let chain = cactus.block_chain[block];
                    let channel = edge.index as usize;
                    let flows = sums
                        .entry(chain)
                        .or_insert_with(|| vec![0.0; cactus.block(*block).ploidy()]);
                    if channel < flows.len() {
                        flows[channel] -= edge.value;
                    }
                    touched.entry(chain).or_default().insert(*block);
                }
            }
        }
        for (chain, flows) in sums.iter_mut() {
            let blocks = touched[chain].len().max(1) as f64;
            for flow in flows.iter_mut() {
                *flow /= blocks;
            }
        }

        let mut affected: BTreeSet<ChainId> = sums.keys().copied().collect();
        if let Some(old) = self.net_chain_contrib.get(&net) {
            affected.extend(old.keys().copied());
        }
        self.net_chain_contrib.insert(net, sums);
        for chain in affected {
            let mut total: Option<Vec<f64>> = None;
            for contrib in self.net_chain_contrib.values() {
                let Some(flows) = contrib.get(&chain) else {
                    continue;
                };
                let acc = total.get_or_insert_with(|| vec![0.0; flows.len()]);
                for (sum, flow) in acc.iter_mut().zip(flows.iter()) {
                    *sum += flow;
                }
            }
            match total {
                Some(flows) => {
                    self.chain_cnvs.insert(chain, flows);
                }
                None => {
                    self.chain_cnvs.remove(&chain);
                }
            }
        }
    }

    /// The chain CNVs a re-seeded module must respect: everything the
    /// other nets' histories claimed, without [net]'s own contribution.
    pub fn chain_cnvs_excluding(&self, net: NetId) -> BTreeMap<ChainId, Vec<f64>> {
        let mut cnvs = self.chain_cnvs.clone();
        if let Some(own) = self.net_chain_contrib.get(&net) {
            for (chain, flows) in own.iter() {
                if let Some(total) = cnvs.get_mut(chain) {
                    for (sum, flow) in total.iter_mut().zip(flows.iter()) {
                        *sum -= flow;
                    }
                }
            }
        }
        cnvs
    }

    /// One cost entry per event across all local histories.
    pub fn rearrangement_cost(&self) -> Vec<f64> {
        self.net_histories
            .values()
            .flat_map(|history| history.events.iter().map(Event::cost))
            .collect()
    }

    /// Half the summed cost; the scalar the sampler scores against.
    pub fn half_cost(&self) -> f64 {
        self.rearrangement_cost().iter().sum::<f64>() / 2.0
    }

    pub fn error_cost(&self) -> f64 {
        self.error
    }

    pub fn event_count(&self) -> usize {
        self.net_histories.values().map(|h| h.events.len()).sum()
    }

    /// The stats line emitted per accepted history.
    pub fn stats(&self) -> String {
        format!(
            "nets={} events={} cost={:.6} error={:.6}",
            self.net_histories.len(),
            self.event_count(),
            self.half_cost(),
            self.error_cost()
        )
    }
}

/// Whether a chain's CNV vector moved beyond [epsilon] in any channel.
pub fn changed_cnvs(new: Option<&Vec<f64>>, old: Option<&Vec<f64>>, epsilon: f64) -> bool {
    let empty = Vec::new();
    let new = new.unwrap_or(&empty);
    let old = old.unwrap_or(&empty);
    if new.len() != old.len() {
        return true;
    }
    new.iter()
        .zip(old.iter())
        .any(|(a, b)| (a - b).abs() > epsilon)
}
