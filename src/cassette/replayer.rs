//! Serves recorded interactions back in recorded order.

use std::collections::VecDeque;

use thiserror::Error;

use super::format::{Cassette, Interaction};

/// Why a replay request could not be served.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// Every recorded interaction has been consumed.
    #[error("Cassette exhausted: unexpected call to {port}::{method}")]
    Exhausted {
        /// Requested port.
        port: String,
        /// Requested method.
        method: String,
    },
    /// The code under test called a different port or method than recorded.
    #[error("Cassette out of order at seq {seq}: expected {expected}, got {actual}")]
    OutOfOrder {
        /// Sequence number of the next recorded interaction.
        seq: u64,
        /// Recorded `port::method`.
        expected: String,
        /// Requested `port::method`.
        actual: String,
    },
}

/// Replays a cassette strictly in recorded order across all ports.
#[derive(Debug)]
pub struct CassetteReplayer {
    pending: VecDeque<Interaction>,
}

impl CassetteReplayer {
    /// Create a replayer over the cassette's interactions.
    #[must_use]
    pub fn new(cassette: Cassette) -> Self {
        let mut interactions = cassette.interactions;
        interactions.sort_by_key(|i| i.seq);
        Self { pending: interactions.into() }
    }

    /// Take the next interaction, which must be for `port` and `method`.
    ///
    /// # Errors
    ///
    /// Returns an error when the cassette is exhausted or the next recorded
    /// interaction is for a different call.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<Interaction, ReplayError> {
        let next = self.pending.pop_front().ok_or_else(|| ReplayError::Exhausted {
            port: port.to_string(),
            method: method.to_string(),
        })?;
        if next.port != port || next.method != method {
            let err = ReplayError::OutOfOrder {
                seq: next.seq,
                expected: format!("{}::{}", next.port, next.method),
                actual: format!("{port}::{method}"),
            };
            self.pending.push_front(next);
            return Err(err);
        }
        Ok(next)
    }

    /// Number of interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}
