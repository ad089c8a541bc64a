//! Online member tracking.
//!
//! `PresenceTracker` owns the set of members currently considered online.
//! Members are keyed by their stable user ID; display names are only looked
//! at when a notification is formatted.
//!
//! Transitions are edge-triggered: a notification is produced only when a
//! member crosses the online/offline boundary. Moving between online, idle
//! and dnd produces nothing.
//!
//! Every update carries the sequence number its event was given on arrival.
//! Handlers run concurrently, so an update can reach the tracker after a
//! later one for the same member; such stale updates are discarded.

use std::collections::{HashMap, HashSet};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::common::types::{MemberId, Profile, Status};

/// A crossing of the online/offline boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    CameOnline { name: String },
    WentOffline { name: String },
}

impl Transition {
    /// Status line posted to the notification channel.
    pub fn notification(&self) -> String {
        match self {
            Self::CameOnline { name } => format!("{} is now online", name),
            Self::WentOffline { name } => format!("{} went offline", name),
        }
    }
}

/// Arrival order of events.
pub type Sequence = u64;

#[derive(Debug, Default)]
struct Members {
    online: HashSet<MemberId>,
    applied: HashMap<MemberId, Sequence>,
}

impl Members {
    /// Record `seq` for `id` unless a later update was already applied.
    fn admit(&mut self, id: MemberId, seq: Sequence) -> bool {
        match self.applied.get(&id) {
            Some(&last) if last > seq => false,
            _ => {
                self.applied.insert(id, seq);
                true
            }
        }
    }
}

/// The set of online members plus the agent's own ID.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    members: Mutex<Members>,
    self_id: RwLock<Option<MemberId>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_self_id(&self, id: MemberId) {
        *self.self_id.write().await = Some(id);
    }

    pub async fn self_id(&self) -> Option<MemberId> {
        *self.self_id.read().await
    }

    /// Self and automated accounts never enter the online set.
    async fn is_ignored(&self, profile: &Profile) -> bool {
        if self.self_id().await == Some(profile.id) {
            return true;
        }
        profile.bot
    }

    /// Apply a presence update and return the transition it causes, if any.
    pub async fn on_presence_event(
        &self,
        profile: &Profile,
        status: Status,
        seq: Sequence,
    ) -> Option<Transition> {
        if self.is_ignored(profile).await {
            debug!("Ignoring presence of {} ({})", profile.name, profile.id);
            return None;
        }

        // Check and mutate under one lock so concurrent updates for the same
        // member cannot both see the old state.
        let mut members = self.members.lock().await;
        if !members.admit(profile.id, seq) {
            debug!("Discarding stale presence #{} of {}", seq, profile.name);
            return None;
        }
        let online = &mut members.online;
        if status.is_offline() {
            online.remove(&profile.id).then(|| Transition::WentOffline {
                name: profile.name.clone(),
            })
        } else {
            online.insert(profile.id).then(|| Transition::CameOnline {
                name: profile.name.clone(),
            })
        }
    }

    /// Seed the online set from a guild snapshot.
    ///
    /// Only adds: members missing from the snapshot stay in the set, so a
    /// reconnect never produces "went offline" for members that dropped while
    /// the gateway was down. Members updated by a later event keep that
    /// state. Returns the number of members added.
    pub async fn on_guild_snapshot<'a, I>(&self, entries: I, seq: Sequence) -> usize
    where
        I: IntoIterator<Item = (&'a Profile, Status)>,
    {
        let self_id = self.self_id().await;
        let mut members = self.members.lock().await;
        let mut added = 0;

        for (profile, status) in entries {
            if profile.bot || self_id == Some(profile.id) {
                continue;
            }
            if !members.admit(profile.id, seq) || status.is_offline() {
                continue;
            }
            if members.online.insert(profile.id) {
                debug!("  User online: {}", profile.name);
                added += 1;
            }
        }

        added
    }

    #[cfg(test)]
    pub async fn is_online(&self, id: MemberId) -> bool {
        self.members.lock().await.online.contains(&id)
    }

    pub async fn online_count(&self) -> usize {
        self.members.lock().await.online.len()
    }

    /// Sorted copy of the online set.
    #[cfg(test)]
    pub async fn online_members(&self) -> Vec<MemberId> {
        let mut members: Vec<MemberId> = self.members.lock().await.online.iter().copied().collect();
        members.sort();
        members
    }
}
