// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};

/// Tolerance of the QR projection and the integer rounding test.
pub const ROUNDING_ERROR: f64 = 1e-10;

/// A reference basis of cycles, pre-factorized for membership queries.
///
/// Each basis cycle is turned into a unitary vector: +1 for elements at
/// even positions, -1 at odd positions, summed per element. The basis
/// matrix is decomposed once (thin QR); a query then costs two
/// matrix-vector products and a triangular solve.
pub struct ReferenceVectors<E>
where
    E: Ord + Clone,
{
    mapping: BTreeMap<E, usize>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
}

impl<E> ReferenceVectors<E>
where
    E: Ord + Clone,
{
    pub fn new(cycles: &[Vec<E>]) -> ReferenceVectors<E> {
        let mut mapping: BTreeMap<E, usize> = BTreeMap::new();
        for cycle in cycles {
            for element in cycle {
                if !mapping.contains_key(element) {
                    mapping.insert(element.clone(), mapping.len());
                }
            }
        }
        let mut vectors = DMatrix::zeros(mapping.len(), cycles.len());
        for (col, cycle) in cycles.iter().enumerate() {
            let vector = unitary_vector(&mapping, cycle)
                .expect("Basis cycle elements are all in the mapping.");
            vectors.set_column(col, &vector);
        }
        let qr = vectors.qr();
        ReferenceVectors {
            mapping,
            q: qr.q(),
            r: qr.r(),
        }
    }

    /// Whether [cycle] is a non-negative integer combination of the
    /// basis cycles.
    pub fn can_explain(&self, cycle: &[E]) -> bool {
        // Elements outside the basis span new dimensions.
        let Some(vector) = unitary_vector(&self.mapping, cycle) else {
            return false;
        };

        // Project onto the orthonormal base; a residual means the
        // vector leaves the basis span.
        let projections = self.q.transpose() * &vector;
        let residual = &vector - &self.q * &projections;
        if residual.norm() > ROUNDING_ERROR * vector.norm() {
            return false;
        }

        let weights = match self.r.solve_upper_triangular(&projections) {
            Some(weights) => weights,
            None => return false,
        };
        weights
            .iter()
            .all(|w| (w - w.round()).abs() < ROUNDING_ERROR && w.round() >= 0.0)
    }
}

fn unitary_vector<E>(mapping: &BTreeMap<E, usize>, cycle: &[E]) -> Option<DVector<f64>>
where
    E: Ord + Clone,
{
    let mut vector = DVector::zeros(mapping.len());
    for (position, element) in cycle.iter().enumerate() {
        let dim = *mapping.get(element)?;
        if position % 2 == 0 {
            vector[dim] += 1.0;
        } else {
            vector[dim] -= 1.0;
        }
    }
    Some(vector)
}
