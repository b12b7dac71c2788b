use jamroom_core::IceCandidate;
use std::collections::VecDeque;

/// Remote candidates that arrived before the remote description.
#[derive(Debug)]
pub struct PendingCandidates {
    items: VecDeque<IceCandidate>,
    limit: usize,
}

impl PendingCandidates {
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::new(),
            limit,
        }
    }

    /// Returns the candidate evicted to make room, if any.
    pub fn push(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.limit == 0 {
            return Some(candidate);
        }
        let evicted = if self.items.len() >= self.limit {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(candidate);
        evicted
    }

    pub fn drain(&mut self) -> Vec<IceCandidate> {
        self.items.drain(..).collect()
    }

    /// Drops everything held. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
