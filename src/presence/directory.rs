//! Channel name directory.
//!
//! Remembers channel names so create/rename/delete events can be announced.
//! This is unrelated to destination resolution, which never caches.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::common::types::ChannelId;

/// Announcement-worthy change to the channel list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelChange {
    Created { name: String },
    Deleted { name: String },
    Renamed { old: String, new: String },
}

impl ChannelChange {
    pub fn notification(&self) -> String {
        match self {
            Self::Created { name } => format!("Channel created {}", name),
            Self::Deleted { name } => format!("Channel deleted {}", name),
            Self::Renamed { old, new } => format!("Channel name changed from {} to {}", old, new),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChannelDirectory {
    names: Mutex<HashMap<ChannelId, String>>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a channel without announcing it.
    pub async fn seed(&self, id: ChannelId, name: String) {
        self.names.lock().await.insert(id, name);
    }

    pub async fn created(&self, id: ChannelId, name: &str) -> ChannelChange {
        self.names.lock().await.insert(id, name.to_string());
        ChannelChange::Created {
            name: name.to_string(),
        }
    }

    pub async fn deleted(&self, id: ChannelId, name: &str) -> ChannelChange {
        let known = self.names.lock().await.remove(&id);
        ChannelChange::Deleted {
            name: known.unwrap_or_else(|| name.to_string()),
        }
    }

    /// Returns a rename when the channel is unknown or its name differs.
    pub async fn updated(&self, id: ChannelId, name: &str) -> Option<ChannelChange> {
        let mut names = self.names.lock().await;
        let old = names.get(&id).cloned();
        if old.as_deref() == Some(name) {
            return None;
        }
        names.insert(id, name.to_string());
        Some(ChannelChange::Renamed {
            old: old.unwrap_or_default(),
            new: name.to_string(),
        })
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.names.lock().await.len()
    }
}
