// --- File: crates/detailing_admin/src/session.rs ---

//! Server-side record of issued admin sessions.
//!
//! Stores only SHA-256 hashes of session tokens, each with an explicit expiry.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Storage for admin sessions, keyed by token hash.
pub trait SessionStore: Send + Sync {
    /// Records a session. May evict others to stay within capacity.
    fn insert(&self, token_hash: String, now: DateTime<Utc>, expires_at: DateTime<Utc>);

    /// True when the session exists and has not expired at `now`.
    fn is_valid(&self, token_hash: &str, now: DateTime<Utc>) -> bool;

    /// Returns whether a session was removed.
    fn remove(&self, token_hash: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    seq: u64,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    next_seq: u64,
}

/// Process-local session store with a hard capacity.
///
/// When full, expired sessions are dropped first, then the oldest live ones.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: Mutex<Sessions>,
    capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sessions> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, token_hash: String, now: DateTime<Utc>, expires_at: DateTime<Utc>) {
        let mut sessions = self.lock();

        if sessions.entries.len() >= self.capacity {
            let before = sessions.entries.len();
            sessions.entries.retain(|_, entry| entry.expires_at > now);
            debug!(
                "[Session] Purged {} expired sessions",
                before - sessions.entries.len()
            );
        }

        while sessions.entries.len() >= self.capacity {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(hash, _)| hash.clone());
            match oldest {
                Some(hash) => {
                    sessions.entries.remove(&hash);
                    debug!("[Session] Evicted oldest session to stay within capacity");
                }
                None => break,
            }
        }

        let seq = sessions.next_seq;
        sessions.next_seq += 1;
        sessions
            .entries
            .insert(token_hash, SessionEntry { seq, expires_at });
    }

    fn is_valid(&self, token_hash: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.lock();
        match sessions.entries.get(token_hash) {
            Some(entry) if entry.expires_at > now => true,
            Some(_) => {
                sessions.entries.remove(token_hash);
                false
            }
            None => false,
        }
    }

    fn remove(&self, token_hash: &str) -> bool {
        self.lock().entries.remove(token_hash).is_some()
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}
