// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

mod test {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use cnhist::cactus::{Block, Cactus, Group, Net, Node, NodeId};
    use cnhist::cycle_cover::initial_history;
    use cnhist::normalize::{is_fully_normalized, normalize, unnormalized_chains};
    use cnhist::sampler::{sample, Emission, ReseedResampler};
    use cnhist::state::{Config, SamplerState};

    /// General "run the pipeline from beginning to end" tests.
    /// Nothing should break or hang.

    fn nid(n: u32) -> NodeId {
        NodeId(n)
    }

    /// Three blocks chained through three nets, the third block at a
    /// quarter of the copy-number of the others.
    fn build_cactus() -> Cactus {
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
            Block::new(nid(0), nid(1), 120, vec![4.0]),
            Block::new(nid(2), nid(3), 80, vec![4.0]),
            Block::new(nid(4), nid(5), 50, vec![1.0]),
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
            .expect("The test cactus must assemble.")
    }

    #[test]
    fn test_normalize_then_sample() {
        let _ = cnhist::logging::init("info");
        let mut cactus = build_cactus();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!is_fully_normalized(&cactus));
        normalize(&mut cactus, &mut rng).expect("Normalization succeeds.");
        assert!(is_fully_normalized(&cactus));
        assert!(unnormalized_chains(&cactus).is_empty());
        cactus
            .check_block_coverage()
            .expect("Every block belongs to a chain.");

        let mut state = SamplerState::new(
            42,
            Config {
                timeout: Duration::from_secs(600),
                ..Config::default()
            },
        );
        let seed_history = initial_history(&cactus, &mut state.rng).expect("Seeding succeeds.");
        for net in cactus.net_ids() {
            assert!(
                seed_history.local_history(net).is_some(),
                "Net {} was not seeded.",
                net
            );
        }

        let mut stats = Vec::new();
        let mut braney = Vec::new();
        let histories = sample(
            &mut state,
            &cactus,
            seed_history,
            4,
            &mut ReseedResampler,
            Emission {
                stats: Some(&mut stats),
                braney: Some(&mut braney),
            },
        )
        .expect("Sampling succeeds.");

        assert_eq!(histories.len(), 2);
        assert!(
            histories[0].half_cost() <= histories[1].half_cost(),
            "The best history is retained up front."
        );
        assert_eq!(String::from_utf8(stats).unwrap().lines().count(), 5);
        assert_eq!(String::from_utf8(braney).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_two_runs_same_seed_same_histories() {
        let mut outputs = Vec::new();
        for _ in 0..2 {
            let mut cactus = build_cactus();
            let mut state = SamplerState::new(
                1234,
                Config {
                    timeout: Duration::from_secs(600),
                    ..Config::default()
                },
            );
            normalize(&mut cactus, &mut state.rng).expect("Normalization succeeds.");
            let seed_history =
                initial_history(&cactus, &mut state.rng).expect("Seeding succeeds.");
            let mut stats = Vec::new();
            sample(
                &mut state,
                &cactus,
                seed_history,
                3,
                &mut ReseedResampler,
                Emission {
                    stats: Some(&mut stats),
                    braney: None,
                },
            )
            .expect("Sampling succeeds.");
            outputs.push(stats);
        }
        assert_eq!(outputs[0], outputs[1], "A fixed seed determines the run.");
    }
}
