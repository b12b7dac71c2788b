use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DEFAULT_MAX_PEERS: usize = 12;
pub const DEFAULT_BPM: u32 = 120;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_peers: usize,
    pub password: Option<String>,
    #[serde(alias = "waitingRoomEnabled")]
    pub waiting_room: bool,
    pub bpm: u32,
}

impl RoomSettings {
    /// An empty password counts as no password.
    pub fn has_password(&self) -> bool {
        self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    pub fn password_matches(&self, given: Option<&str>) -> bool {
        if !self.has_password() {
            return true;
        }
        self.password.as_deref() == given
    }

    pub fn merge(&mut self, patch: RoomSettingsPatch) {
        if let Some(max_peers) = patch.max_peers {
            self.max_peers = max_peers;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(waiting_room) = patch.waiting_room {
            self.waiting_room = waiting_room;
        }
        if let Some(bpm) = patch.bpm {
            self.bpm = bpm;
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_peers: DEFAULT_MAX_PEERS,
            password: None,
            waiting_room: false,
            bpm: DEFAULT_BPM,
        }
    }
}

/// Partial settings update. Absent fields keep their value; an explicit
/// `"password": null` clears the password.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_peers: Option<usize>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Option<String>>,
    #[serde(
        default,
        alias = "waitingRoomEnabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub waiting_room: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
