//! Candidate employee ids.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::distributions::Alphanumeric;
use rand::Rng;

pub const CANDIDATE_LEN: usize = 7;

/// Proposes the id injected into the creation form before the target system
/// echoes back its authoritative one.
pub trait IdCandidateSource: Send + Sync {
    fn next_candidate(&self) -> String;
}

/// Seven characters drawn from `[A-Za-z0-9]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdCandidates;

impl IdCandidateSource for RandomIdCandidates {
    fn next_candidate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CANDIDATE_LEN)
            .map(char::from)
            .collect()
    }
}

/// Cycles through a fixed list. Deterministic, for tests and replays.
#[derive(Debug)]
pub struct SequenceIdCandidates {
    candidates: Vec<String>,
    next: AtomicUsize,
}

impl SequenceIdCandidates {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl IdCandidateSource for SequenceIdCandidates {
    fn next_candidate(&self) -> String {
        if self.candidates.is_empty() {
            return String::new();
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.candidates.len();
        self.candidates[index].clone()
    }
}
