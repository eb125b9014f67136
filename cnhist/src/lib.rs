// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

pub mod cactus;
pub mod cycle_cover;
pub mod decomposition;
pub mod dijkstra;
pub mod error;
pub mod flows;
pub mod history;
pub mod logging;
pub mod module;
pub mod normalize;
pub mod sampler;
pub mod simplify;
pub mod state;
mod test_cycle_cover;
mod test_decomposition;
mod test_dijkstra;
mod test_flows;
#[cfg(test)]
mod test_graphs;
mod test_normalize;
mod test_sampler;
mod test_simplify;
