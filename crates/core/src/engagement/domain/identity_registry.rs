use std::collections::HashMap;

use super::tracked_identity::{IdentityId, TrackedIdentity};

/// All identities observed during the session, keyed by tracker id.
///
/// Entries are created on first observation and never evicted.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    identities: HashMap<IdentityId, TrackedIdentity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identity for `id`, inserting a fresh `Unknown` one if
    /// this is the first time the id is seen.
    pub fn lookup_or_insert(&mut self, id: IdentityId) -> &mut TrackedIdentity {
        self.identities
            .entry(id)
            .or_insert_with(|| TrackedIdentity::new(id))
    }

    pub fn get(&self, id: IdentityId) -> Option<&TrackedIdentity> {
        self.identities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
