//! In-memory blueprint store with lazy expiry.
//!
//! One record per session key, last-draft-wins. Records are reaped on the
//! next store-touching operation once they outlive the TTL — there is no
//! background sweeper because the map is bounded by active-session count.
//! The store also owns the per-key build lock, so a double confirmation
//! cannot race two builds onto the same session even if the transport-side
//! button removal loses the race.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use crate::blueprint::Blueprint;
use crate::error::ConfirmError;

/// A drafted blueprint awaiting confirmation.
#[derive(Debug, Clone)]
pub struct BlueprintRecord {
    pub blueprint: Blueprint,
    pub created_at: Instant,
    /// Identity of this particular draft. Confirmations carry it so a
    /// stale button press after an overwrite reports expiry instead of
    /// silently building the newer draft.
    pub draft_id: Uuid,
}

/// Process-wide expiring cache, injected into handlers behind an `Arc`.
pub struct BlueprintStore {
    ttl: Duration,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, BlueprintRecord>,
    building: HashSet<String>,
}

impl BlueprintStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Store a fresh draft, overwriting any previous record for the key.
    /// Returns the new draft id for the confirmation affordance.
    pub fn put(&self, key: &str, blueprint: Blueprint, now: Instant) -> Uuid {
        let draft_id = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.insert(
            key.to_string(),
            BlueprintRecord {
                blueprint,
                created_at: now,
                draft_id,
            },
        );
        draft_id
    }

    pub fn get(&self, key: &str) -> Option<BlueprintRecord> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.get(key).cloned()
    }

    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.remove(key);
    }

    /// Reap every record older than the TTL. Called opportunistically at
    /// the start of any store-touching handler.
    pub fn sweep(&self, now: Instant) {
        let ttl = self.ttl;
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.records.len();
        inner
            .records
            .retain(|_, rec| now.saturating_duration_since(rec.created_at) <= ttl);
        let reaped = before - inner.records.len();
        if reaped > 0 {
            debug!(reaped, "swept expired blueprints");
        }
    }

    /// Resolve a confirmation: the record must still exist and carry the
    /// same draft id the affordance was minted with.
    pub fn confirm(&self, key: &str, draft_id: Uuid) -> Result<Blueprint, ConfirmError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        match inner.records.get(key) {
            Some(rec) if rec.draft_id == draft_id => Ok(rec.blueprint.clone()),
            _ => Err(ConfirmError::Expired),
        }
    }

    /// Claim the per-key build lock. Returns `false` when a build for
    /// this key is already running.
    pub fn try_lock(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.building.insert(key.to_string())
    }

    pub fn unlock(&self, key: &str) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.building.remove(key);
    }
}
