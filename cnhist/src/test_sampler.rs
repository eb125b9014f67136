// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::cycle_cover::initial_history;
    use crate::sampler::{mc_test, sample, Emission, ReseedResampler};
    use crate::state::{Config, SamplerState};
    use crate::test_graphs::two_net_cactus;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0xd1ce)
    }

    fn state(seed: u64) -> SamplerState {
        SamplerState::new(
            seed,
            Config {
                timeout: Duration::from_secs(3600),
                ..Config::default()
            },
        )
    }

    #[test]
    fn test_metropolis_accepts_downhill() {
        let mut rng = rng();
        for _ in 0..100 {
            assert!(mc_test(8.0, 10.0, 1.0, &mut rng));
            assert!(mc_test(10.0, 10.0, 1.0, &mut rng), "Equal cost passes.");
        }
    }

    #[test]
    fn test_metropolis_uphill_rate() {
        // Cost 12 against 10 at temperature 1: acceptance probability
        // is exp(-2) ~ 0.1353.
        let mut rng = rng();
        let trials = 20000;
        let accepted = (0..trials)
            .filter(|_| mc_test(12.0, 10.0, 1.0, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!(
            (0.12..0.15).contains(&rate),
            "Acceptance rate {} is off exp(-2).",
            rate
        );
    }

    #[test]
    fn test_uphill_relaxes_with_temperature() {
        let mut rng = rng();
        let trials = 20000;
        let hot = (0..trials)
            .filter(|_| mc_test(12.0, 10.0, 10.0, &mut rng))
            .count();
        let cold = (0..trials)
            .filter(|_| mc_test(12.0, 10.0, 0.5, &mut rng))
            .count();
        assert!(hot > 5 * cold, "hot={} cold={}", hot, cold);
    }

    #[test]
    fn test_sample_emits_every_accepted_history() {
        let cactus = two_net_cactus(2.0);
        let mut state = state(7);
        let seed_history = initial_history(&cactus, &mut state.rng).expect("Seeding succeeds.");

        let mut stats = Vec::new();
        let mut braney = Vec::new();
        let emission = Emission {
            stats: Some(&mut stats),
            braney: Some(&mut braney),
        };
        let histories = sample(
            &mut state,
            &cactus,
            seed_history,
            3,
            &mut ReseedResampler,
            emission,
        )
        .expect("Sampling succeeds.");

        assert_eq!(histories.len(), 2, "Best-so-far and latest are retained.");
        let stats = String::from_utf8(stats).unwrap();
        assert_eq!(
            stats.lines().count(),
            4,
            "The seed history and three sampled ones."
        );
        let braney = String::from_utf8(braney).unwrap();
        let lines: Vec<&str> = braney.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            assert!(
                line.starts_with(&format!("{} ", i + 1)),
                "Braney indices start at 1: {:?}",
                line
            );
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let cactus = two_net_cactus(2.0);
        let mut first_out = Vec::new();
        let mut second_out = Vec::new();
        for out in [&mut first_out, &mut second_out] {
            let mut state = state(99);
            let seed_history =
                initial_history(&cactus, &mut state.rng).expect("Seeding succeeds.");
            sample(
                &mut state,
                &cactus,
                seed_history,
                5,
                &mut ReseedResampler,
                Emission {
                    stats: Some(out),
                    braney: None,
                },
            )
            .expect("Sampling succeeds.");
        }
        assert_eq!(first_out, second_out, "Same seed, same run.");
    }

    #[test]
    fn test_expired_deadline_returns_the_seed() {
        let cactus = two_net_cactus(2.0);
        let mut state = SamplerState::new(
            1,
            Config {
                timeout: Duration::from_secs(0),
                ..Config::default()
            },
        );
        let seed_history = initial_history(&cactus, &mut state.rng).expect("Seeding succeeds.");
        let cost = seed_history.half_cost();
        let histories = sample(
            &mut state,
            &cactus,
            seed_history,
            100,
            &mut ReseedResampler,
            Emission::none(),
        )
        .expect("An expired deadline is not an error.");
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].half_cost(), cost);
        assert_eq!(histories[1].half_cost(), cost);
    }
}
