//! Per-user quota and dialogue state.
//!
//! One [`UserRecord`] per chat identity, created lazily on first contact and
//! never evicted — unbounded growth is an accepted limitation of the
//! in-memory store (an LRU or TTL policy is the known follow-up if this
//! outlives a prototype). Records are mutated only by the conversation
//! engine.

use crate::{ChatId, ContentType, Language};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Free tries granted to a previously-unseen user.
pub const INITIAL_FREE_TRIES: i32 = 5;

/// Quota and dialogue state for one chat identity.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// Remaining free generations. Consumed by `/trend` while no active
    /// subscription covers the user; top-ups are an administrative action
    /// outside the engine.
    pub tries_left: i32,
    pub subscription_active: bool,
    pub subscription_expiry: Option<DateTime<Utc>>,
    /// Referral counter. Written by the (external) referral flow, never
    /// read by the engine.
    pub invite_count: u32,
    /// Content type picked from the menu, awaiting a language selection.
    pub pending_content_type: Option<ContentType>,
    /// Only ever set and consumed within the same selection-completion
    /// transition; cleared together with `pending_content_type`.
    pub pending_language: Option<Language>,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            tries_left: INITIAL_FREE_TRIES,
            subscription_active: false,
            subscription_expiry: None,
            invite_count: 0,
            pending_content_type: None,
            pending_language: None,
        }
    }
}

impl UserRecord {
    /// A subscription covers the user iff the flag is set and the expiry is
    /// strictly in the future. Both conditions are evaluated fresh at each
    /// call site, never cached.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription_active && self.subscription_expiry.is_some_and(|expiry| expiry > now)
    }

    /// Drop any in-flight menu selection, returning the dialogue to idle.
    pub fn clear_pending(&mut self) {
        self.pending_content_type = None;
        self.pending_language = None;
    }
}

/// Capability trait over user-record storage.
///
/// The engine depends only on this seam, so the in-memory map can be swapped
/// for a database-backed store without touching engine logic. `get_or_create`
/// hands out a live per-user handle; mutation happens in place through it,
/// which is why the trait has no separate `save` operation.
#[async_trait]
pub trait UserStateStore: Send + Sync {
    /// Fetch the record for `chat_id`, creating a default one if absent.
    /// Idempotent: repeated calls return the same shared handle.
    async fn get_or_create(&self, chat_id: ChatId) -> Arc<Mutex<UserRecord>>;
}

/// Process-lifetime in-memory store.
///
/// Each record sits behind its own async mutex. Holding that lock for the
/// full handling of one message — including the generation round-trip —
/// serializes two rapid messages from the same user while leaving every
/// other user's handling untouched.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<ChatId, Arc<Mutex<UserRecord>>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStateStore for InMemoryUserStore {
    async fn get_or_create(&self, chat_id: ChatId) -> Arc<Mutex<UserRecord>> {
        if let Some(record) = self.users.read().await.get(&chat_id) {
            return record.clone();
        }

        // Re-check under the write lock; another task may have created the
        // record between the two lock acquisitions.
        let mut users = self.users.write().await;
        users
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(UserRecord::default())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn new_record_has_documented_defaults() {
        let record = UserRecord::default();

        assert_eq!(record.tries_left, INITIAL_FREE_TRIES);
        assert!(!record.subscription_active);
        assert_eq!(record.subscription_expiry, None);
        assert_eq!(record.invite_count, 0);
        assert_eq!(record.pending_content_type, None);
        assert_eq!(record.pending_language, None);
    }

    #[test]
    fn subscription_requires_flag_and_future_expiry() {
        let now = Utc::now();
        let mut record = UserRecord {
            subscription_active: true,
            subscription_expiry: Some(now + Duration::hours(1)),
            ..UserRecord::default()
        };
        assert!(record.has_active_subscription(now));

        // Expiry exactly at `now` does not count — strictly in the future.
        record.subscription_expiry = Some(now);
        assert!(!record.has_active_subscription(now));

        record.subscription_expiry = Some(now - Duration::hours(1));
        assert!(!record.has_active_subscription(now));

        record.subscription_active = false;
        record.subscription_expiry = Some(now + Duration::hours(1));
        assert!(!record.has_active_subscription(now));
    }

    #[test]
    fn subscription_without_expiry_is_inactive() {
        let record = UserRecord {
            subscription_active: true,
            ..UserRecord::default()
        };
        assert!(!record.has_active_subscription(Utc::now()));
    }

    #[test]
    fn clear_pending_resets_both_fields() {
        let mut record = UserRecord {
            pending_content_type: Some(ContentType::TikTok),
            pending_language: Some(Language::French),
            ..UserRecord::default()
        };

        record.clear_pending();

        assert_eq!(record.pending_content_type, None);
        assert_eq!(record.pending_language, None);
    }

    #[tokio::test]
    async fn get_or_create_returns_shared_handle() {
        let store = InMemoryUserStore::new();

        let first = store.get_or_create(42).await;
        first.lock().await.tries_left = 1;

        // The second lookup sees the mutation made through the first handle.
        let second = store.get_or_create(42).await;
        assert_eq!(second.lock().await.tries_left, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn distinct_users_get_distinct_records() {
        let store = InMemoryUserStore::new();

        let alice = store.get_or_create(1).await;
        alice.lock().await.tries_left = 0;

        let bob = store.get_or_create(2).await;
        assert_eq!(bob.lock().await.tries_left, INITIAL_FREE_TRIES);
    }
}
