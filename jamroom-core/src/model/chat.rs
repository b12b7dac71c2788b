use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Monotonic; equals the creation time in ms unless two messages share a millisecond.
    pub id: u64,
    pub peer_id: PeerId,
    pub nickname: String,
    pub message: String,
    pub timestamp: u64,
}
