// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::cactus::STUB_NODE;
    use crate::dijkstra::{dijkstra, MissingEdges};
    use crate::module::{AdjacencyTable, Module};
    use crate::test_graphs::{circle4_cactus, nid, two_net_cactus};

    #[test]
    fn test_circle_distances() {
        let cactus = circle4_cactus(1.0);
        let module = Module::new(&cactus, 0, &BTreeMap::new());
        let table = AdjacencyTable::compute(&module);
        let distances = dijkstra(nid(0), 1.0, &module, &table, None, false);

        // Even distances settle every second node of the circle, odd
        // distances the others.
        assert_eq!(distances[&nid(0)], (0, -1));
        assert_eq!(distances[&nid(1)], (-1, 1));
        assert_eq!(distances[&nid(2)], (1, -1));
        assert_eq!(distances[&nid(3)], (-1, 2));
        assert_eq!(distances[&STUB_NODE], (-1, -1), "The stub is unreached.");
    }

    #[test]
    fn test_distances_are_nonnegative_or_unreached() {
        let cactus = circle4_cactus(3.0);
        let module = Module::new(&cactus, 0, &BTreeMap::new());
        let table = AdjacencyTable::compute(&module);
        for origin in module.nodes() {
            if origin == STUB_NODE {
                continue;
            }
            let distances = dijkstra(origin, 3.0, &module, &table, None, false);
            for (even, odd) in distances.values() {
                assert!(*even >= -1 && *odd >= -1);
            }
        }
    }

    #[test]
    fn test_block_twin_excludes_the_twin_seed() {
        let cactus = two_net_cactus(2.0);
        let module = Module::new(&cactus, 0, &BTreeMap::new());
        let table = AdjacencyTable::compute(&module);

        let open = dijkstra(nid(0), 2.0, &module, &table, None, false);
        assert_eq!(open[&nid(1)].1, 1, "The twin is one odd step away.");

        let blocked = dijkstra(nid(0), 2.0, &module, &table, None, true);
        assert_eq!(
            blocked[&nid(1)].1,
            -1,
            "block_twin removes exactly the twin seed."
        );
        assert_eq!(open[&nid(0)].0, blocked[&nid(0)].0);
    }

    #[test]
    fn test_missing_edges_cut_the_search() {
        let cactus = circle4_cactus(1.0);
        let module = Module::new(&cactus, 0, &BTreeMap::new());
        let table = AdjacencyTable::compute(&module);
        let missing: MissingEdges = [(nid(0), nid(1), 0)].into_iter().collect();
        let distances = dijkstra(nid(0), 1.0, &module, &table, Some(&missing), false);

        assert_eq!(distances[&nid(0)], (0, -1));
        assert_eq!(
            distances[&nid(1)],
            (-1, -1),
            "The only path out of n0 runs over the excluded segment."
        );
        assert_eq!(distances[&nid(2)], (-1, -1));
    }

    #[test]
    fn test_same_origin_same_result() {
        let cactus = circle4_cactus(1.0);
        let module = Module::new(&cactus, 0, &BTreeMap::new());
        let table = AdjacencyTable::compute(&module);
        let first = dijkstra(nid(2), -1.0, &module, &table, None, false);
        let second = dijkstra(nid(2), -1.0, &module, &table, None, false);
        assert_eq!(first, second);
    }
}
