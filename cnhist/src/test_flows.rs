// SPDX-FileCopyrightText: 2024 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

#[cfg(test)]
mod tests {
    use crate::flows::{Cycle, Edge, Event, ADJACENCY_INDEX};
    use crate::test_graphs::nid;

    fn square_cycle() -> Cycle {
        // n0 -> n1 -> n2 -> n3 -> n0, alternating adjacency/segment.
        Cycle::new(vec![
            Edge::new(nid(0), nid(1), 1.0, ADJACENCY_INDEX),
            Edge::new(nid(1), nid(2), -1.0, 0),
            Edge::new(nid(2), nid(3), 1.0, ADJACENCY_INDEX),
            Edge::new(nid(3), nid(0), -1.0, 0),
        ])
    }

    #[test]
    fn test_cycle_is_closed_walk() {
        assert!(square_cycle().is_closed_walk());
        let broken = Cycle::new(vec![
            Edge::new(nid(0), nid(1), 1.0, ADJACENCY_INDEX),
            Edge::new(nid(2), nid(0), -1.0, 0),
        ]);
        assert!(!broken.is_closed_walk());
        assert!(Cycle::default().is_closed_walk());
    }

    #[test]
    fn test_cycle_rotation() {
        let cycle = square_cycle();
        let rotated = cycle.start_at(2);
        assert_eq!(rotated[0], cycle[2]);
        assert_eq!(rotated[3], cycle[1]);
        assert!(rotated.is_closed_walk());
        assert_eq!(cycle.start_at(4), cycle, "Full rotation is the identity.");
    }

    #[test]
    fn test_cycle_reversal() {
        let cycle = square_cycle();
        let reversed = cycle.reversed();
        assert!(reversed.is_closed_walk());
        assert_eq!(reversed.len(), cycle.len());
        assert_eq!(reversed[0].start, cycle[3].finish);
        assert_eq!(reversed[0].finish, cycle[3].start);
        assert_eq!(reversed.reversed(), cycle, "Double reversal is the identity.");
    }

    #[test]
    fn test_modular_lookup() {
        let cycle = square_cycle();
        assert_eq!(*cycle.at(4), cycle[0]);
        assert_eq!(*cycle.at(7), cycle[3]);
    }

    #[test]
    fn test_edge_inverse() {
        let edge = Edge::new(nid(0), nid(1), 2.5, 1);
        let inverse = Edge::new(nid(1), nid(0), -2.5, 1);
        assert!(edge.is_inverse_of(&inverse));
        assert!(inverse.is_inverse_of(&edge));
        let same_sign = Edge::new(nid(1), nid(0), 2.5, 1);
        assert!(!edge.is_inverse_of(&same_sign));
        let other_channel = Edge::new(nid(1), nid(0), -2.5, 0);
        assert!(!edge.is_inverse_of(&other_channel));
    }

    #[test]
    fn test_adjacency_index_is_canonical() {
        let edge = Edge::new(nid(7), nid(3), 1.0, ADJACENCY_INDEX);
        assert_eq!(edge.adjacency_index(), edge.reversed().adjacency_index());
        assert_eq!(edge.adjacency_index(), (nid(3), nid(7), ADJACENCY_INDEX));
    }

    #[test]
    fn test_event_ratio_and_cost() {
        let event = Event::new(square_cycle());
        assert_eq!(event.ratio, 1.0);
        assert_eq!(event.cost(), 2.0);
        let negative = Event::new(square_cycle().reversed());
        assert_eq!(negative.ratio, 1.0, "Ratio ignores the orientation.");
    }
}
