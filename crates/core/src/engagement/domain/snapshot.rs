use serde::{Deserialize, Serialize};

use super::engagement_status::EngagementStatus;
use super::tracked_identity::IdentityId;

/// One identity's row in a published snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementEntry {
    pub id: IdentityId,
    pub emotion: String,
    #[serde(rename = "engagement")]
    pub status: EngagementStatus,
}

/// Immutable view of engagement and attendance at one frame.
///
/// Built whole by the producer and replaced whole on publish; never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ids counted by attendance sampling so far, ascending.
    pub present_ids: Vec<IdentityId>,
    /// Identities observed in the frame the snapshot was built from.
    #[serde(rename = "engagement")]
    pub engagement_list: Vec<EngagementEntry>,
    /// Frame number the snapshot was built at; 0 before the first publish.
    pub frame: u64,
    /// False once the producer has stopped and no newer snapshot will come.
    pub live: bool,
}

impl Snapshot {
    /// Placeholder served before the producer publishes anything.
    pub fn empty() -> Self {
        Self {
            present_ids: Vec::new(),
            engagement_list: Vec::new(),
            frame: 0,
            live: true,
        }
    }

    /// Copy of this snapshot marked as final.
    pub fn finished(&self) -> Self {
        Self {
            live: false,
            ..self.clone()
        }
    }

    pub fn engaged_count(&self) -> usize {
        self.engagement_list
            .iter()
            .filter(|e| e.status == EngagementStatus::Engaged)
            .count()
    }
}
