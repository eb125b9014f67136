// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::time::Duration;

use helper::timer::Timer;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Initial Metropolis temperature.
pub const TEMPERATURE: f64 = 1.0;
/// Wall-clock budget of a sampling run in seconds.
pub const MAX_TIMER_LENGTH: u64 = 3600 * 24;
/// Chain CNV changes below this do not trigger re-seeding.
pub const CNV_EPSILON: f64 = 1e-6;

#[derive(Clone)]
pub struct Config {
    pub temperature: f64,
    pub timeout: Duration,
    pub cnv_epsilon: f64,
    /// Render a progress spinner on stdout while sampling.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            temperature: TEMPERATURE,
            timeout: Duration::from_secs(MAX_TIMER_LENGTH),
            cnv_epsilon: CNV_EPSILON,
            progress: false,
        }
    }
}

/// Everything one sampling run mutates besides the histories: the
/// deadline and the seeded random number generator. A fixed seed fully
/// determines the run.
pub struct SamplerState {
    pub timer: Timer,
    pub rng: StdRng,
    pub config: Config,
}

impl SamplerState {
    pub fn new(seed: u64, config: Config) -> SamplerState {
        SamplerState {
            timer: Timer::new(config.timeout),
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    pub fn run_condition_fulfilled(&self) -> bool {
        !self.timer.timed_out()
    }
}
