use std::collections::BTreeSet;

use super::tracked_identity::IdentityId;

/// Identities counted as present during the session.
///
/// Ids are only added at sampling boundaries (every `sample_interval`-th
/// frame), so someone who appears and leaves entirely between two
/// boundaries is never counted. The set never shrinks.
#[derive(Debug, Clone)]
pub struct SessionAttendance {
    sample_interval: u64,
    seen_ids: BTreeSet<IdentityId>,
}

impl SessionAttendance {
    /// `sample_interval` is clamped to at least 1.
    pub fn new(sample_interval: u64) -> Self {
        Self {
            sample_interval: sample_interval.max(1),
            seen_ids: BTreeSet::new(),
        }
    }

    pub fn is_sampling_boundary(&self, frame_number: u64) -> bool {
        frame_number % self.sample_interval == 0
    }

    /// Unions `present` into the seen set when `frame_number` is a sampling
    /// boundary. Returns whether a sample was taken.
    pub fn sample<I>(&mut self, frame_number: u64, present: I) -> bool
    where
        I: IntoIterator<Item = IdentityId>,
    {
        if !self.is_sampling_boundary(frame_number) {
            return false;
        }
        self.seen_ids.extend(present);
        true
    }

    pub fn contains(&self, id: IdentityId) -> bool {
        self.seen_ids.contains(&id)
    }

    pub fn count(&self) -> usize {
        self.seen_ids.len()
    }

    /// Seen ids in ascending order.
    pub fn seen_ids(&self) -> Vec<IdentityId> {
        self.seen_ids.iter().copied().collect()
    }
}
