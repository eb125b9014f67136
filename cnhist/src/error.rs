// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use thiserror::Error;

/// Fatal conditions of the history machinery.
///
/// Expected outcomes (cycles lost in approximation, degenerate cycles,
/// an expired sampling deadline) are handled locally and never show up
/// here.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// An internal invariant broke. Carries a diagnostic dump of the
    /// offending structures.
    #[error("structural violation: {context}\n{dump}")]
    StructuralViolation { context: String, dump: String },

    #[error("emission failed: {0}")]
    Emission(#[from] std::io::Error),
}

impl HistoryError {
    pub fn structural(context: impl Into<String>, dump: impl Into<String>) -> HistoryError {
        HistoryError::StructuralViolation {
            context: context.into(),
            dump: dump.into(),
        }
    }
}
