// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::io::Write;

use helper::choice::{cumulative_pick, total_weight};
use helper::spinner::Spinner;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use crate::cactus::{Cactus, ChainId, NetId};
use crate::cycle_cover::seed_history;
use crate::error::HistoryError;
use crate::history::{changed_cnvs, CactusHistory};
use crate::state::SamplerState;

/// The seam to the local move machinery: rebuilds one net's history
/// and publishes its CNVs into the cactus history.
pub trait ModuleResampler {
    fn create_new_history(
        &mut self,
        cactus: &Cactus,
        history: &mut CactusHistory,
        net: NetId,
        rng: &mut StdRng,
    ) -> Result<(), HistoryError>;
}

/// Default resampler: throws the net's local history away and re-seeds
/// the module. The randomized closure order, tie-breaks and overlap
/// choices make every rebuild a different draw from the cycle space.
pub struct ReseedResampler;

impl ModuleResampler for ReseedResampler {
    fn create_new_history(
        &mut self,
        cactus: &Cactus,
        history: &mut CactusHistory,
        net: NetId,
        rng: &mut StdRng,
    ) -> Result<(), HistoryError> {
        seed_history(cactus, history, net, rng)
    }
}

//////////////////////////////////////////
// Choosing a net to modify
//////////////////////////////////////////

fn enumerate_nets(history: &CactusHistory) -> Vec<(f64, NetId)> {
    history
        .net_histories
        .iter()
        .map(|(net, local)| (local.density(), *net))
        .collect()
}

fn weighted_choice<'a, T>(options: &'a [(f64, T)], rng: &mut StdRng) -> Option<&'a T> {
    let weights: Vec<f64> = options.iter().map(|option| option.0).collect();
    let total = total_weight(&weights);
    if total <= 0.0 {
        return None;
    }
    let target = rng.gen_range(0.0..total);
    cumulative_pick(&weights, target).map(|index| &options[index].1)
}

fn choose_net(history: &CactusHistory, rng: &mut StdRng) -> Option<NetId> {
    weighted_choice(&enumerate_nets(history), rng).copied()
}

//////////////////////////////////////////
// Propagation through the graph
//////////////////////////////////////////

fn modify_cactus_history_chain(
    cactus: &Cactus,
    old: &CactusHistory,
    new: &mut CactusHistory,
    chain: ChainId,
    epsilon: f64,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    let children: Vec<NetId> = cactus.chains2nets.set_iter(&chain).copied().collect();
    for net in children {
        seed_history(cactus, new, net, rng)?;
        modify_cactus_history_net(cactus, old, new, net, epsilon, rng)?;
    }
    Ok(())
}

fn modify_cactus_history_net(
    cactus: &Cactus,
    old: &CactusHistory,
    new: &mut CactusHistory,
    net: NetId,
    epsilon: f64,
    rng: &mut StdRng,
) -> Result<(), HistoryError> {
    let chains: Vec<ChainId> = cactus.nets2chains.set_iter(&net).copied().collect();
    for chain in chains {
        if changed_cnvs(
            new.chain_cnvs.get(&chain),
            old.chain_cnvs.get(&chain),
            epsilon,
        ) {
            modify_cactus_history_chain(cactus, old, new, chain, epsilon, rng)?;
        }
    }
    Ok(())
}

/// One proposal: resample a density-chosen net, then re-seed down the
/// oriented net tree wherever the chain CNVs moved.
fn modify_cactus_history(
    cactus: &Cactus,
    history: &CactusHistory,
    resampler: &mut dyn ModuleResampler,
    epsilon: f64,
    rng: &mut StdRng,
) -> Result<CactusHistory, HistoryError> {
    if history.net_histories.is_empty() {
        return Ok(history.clone());
    }
    let mut new = history.clone();
    let net = choose_net(history, rng).expect("Non-empty history has a net to choose.");
    resampler.create_new_history(cactus, &mut new, net, rng)?;
    modify_cactus_history_net(cactus, history, &mut new, net, epsilon, rng)?;
    Ok(new)
}

//////////////////////////////////////////
// MC exploration
//////////////////////////////////////////

/// Metropolis criterion. Proposals at most as costly as the current
/// history always pass.
pub(crate) fn mc_test(new_score: f64, old_score: f64, temperature: f64, rng: &mut StdRng) -> bool {
    debug!("TEST {} {}", old_score, new_score);
    new_score <= old_score || rng.gen::<f64>() < ((old_score - new_score) / temperature).exp()
}

/// Proposes until one history is accepted. Every refusal relaxes the
/// temperature by 1%, so a stuck search loosens itself up.
fn choose_new_history(
    cactus: &Cactus,
    history: &CactusHistory,
    resampler: &mut dyn ModuleResampler,
    state: &mut SamplerState,
    index: usize,
) -> Result<CactusHistory, HistoryError> {
    let mut temperature = state.config.temperature;
    let epsilon = state.config.cnv_epsilon;
    let mut depth = 1;
    loop {
        let new = modify_cactus_history(cactus, history, resampler, epsilon, &mut state.rng)?;
        if mc_test(
            new.half_cost(),
            history.half_cost(),
            temperature,
            &mut state.rng,
        ) {
            info!(
                "HISTORY {} {} cost={:.6} error={:.6}",
                index,
                depth,
                new.half_cost(),
                new.error_cost()
            );
            return Ok(new);
        }
        debug!("REFUSE");
        temperature *= 1.01;
        depth += 1;
    }
}

//////////////////////////////////////////
// Emission
//////////////////////////////////////////

/// Optional append-only output streams. Formatting beyond the stats
/// and braney records is left to external formatters.
#[derive(Default)]
pub struct Emission<'a> {
    pub stats: Option<&'a mut dyn Write>,
    pub braney: Option<&'a mut dyn Write>,
}

impl Emission<'_> {
    pub fn none() -> Emission<'static> {
        Emission::default()
    }

    fn emit_stats(&mut self, history: &CactusHistory) -> Result<(), HistoryError> {
        if let Some(stats) = self.stats.as_mut() {
            writeln!(stats, "{}", history.stats())?;
        }
        Ok(())
    }

    /// The braney record of an accepted history. Index 0 is the seed,
    /// so the sampled histories start at 1.
    fn emit_braney(&mut self, index: usize, history: &CactusHistory) -> Result<(), HistoryError> {
        if let Some(braney) = self.braney.as_mut() {
            writeln!(braney, "{} {:.6}", index + 1, history.half_cost())?;
        }
        Ok(())
    }
}

//////////////////////////////////////////
// Master function
//////////////////////////////////////////

/// Samples up to [size] histories starting from [seed_history].
///
/// Every accepted history is emitted; in memory only the best-so-far
/// and the latest are retained and returned (best first). The run ends
/// at the requested size or the configured wall-clock deadline.
pub fn sample(
    state: &mut SamplerState,
    cactus: &Cactus,
    seed_history: CactusHistory,
    size: usize,
    resampler: &mut dyn ModuleResampler,
    mut emission: Emission,
) -> Result<Vec<CactusHistory>, HistoryError> {
    info!("Sampling history space of cactus graph.");
    state.timer.start();
    let mut spinner = state
        .config
        .progress
        .then(|| Spinner::new("Sampling histories ".to_string()));

    info!(
        "HISTORY 0 0 cost={:.6} error={:.6}",
        seed_history.half_cost(),
        seed_history.error_cost()
    );
    emission.emit_stats(&seed_history)?;
    let mut best = seed_history.clone();
    let mut latest = seed_history;

    for index in 0..size {
        if !state.run_condition_fulfilled() {
            debug!("Sampling deadline exceeded.");
            break;
        }
        if let Some(spinner) = spinner.as_mut() {
            spinner.update(Some(format!(
                "{} of {} - Runtime: {}",
                index,
                size,
                state.timer.time_passed_str()
            )));
        }
        let new = choose_new_history(cactus, &latest, resampler, state, index)?;
        emission.emit_stats(&new)?;
        emission.emit_braney(index, &new)?;
        if new.half_cost() < best.half_cost() {
            best = new.clone();
        }
        latest = new;
    }
    if let Some(spinner) = spinner.as_ref() {
        spinner.done(format!("Sampled histories - {}", state.timer.time_passed_str()));
    }
    Ok(vec![best, latest])
}
