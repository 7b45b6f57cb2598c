//! Keyed Store Implementation

use crate::error::StateStoreError;
use crate::window::RecentWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Default bound on the number of distinct users tracked
pub const DEFAULT_MAX_USERS: usize = 100_000;

/// Keyed per-user read-modify-write primitives the rule engine depends on.
///
/// Must be sequentially consistent for a single user under partitioned
/// processing; no cross-user atomicity is required.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Push a timestamp onto the user's window, trim to `capacity`, and
    /// return the retained timestamps newest-first.
    async fn push_and_trim(
        &self,
        user_id: &str,
        timestamp: DateTime<Utc>,
        capacity: usize,
    ) -> Result<Vec<DateTime<Utc>>, StateStoreError>;

    /// Last-known location for the user, if any transaction has been seen
    async fn last_location(&self, user_id: &str) -> Result<Option<String>, StateStoreError>;

    /// Overwrite the user's last-known location
    async fn set_location(&self, user_id: &str, location: &str) -> Result<(), StateStoreError>;
}

/// State held for one user
#[derive(Debug)]
struct UserState {
    window: RecentWindow,
    location: Option<String>,
    recent: VecDeque<Value>,
    touched: u64,
}

impl UserState {
    fn new(touched: u64) -> Self {
        Self {
            window: RecentWindow::default(),
            location: None,
            recent: VecDeque::new(),
            touched,
        }
    }
}

/// In-memory state store keyed by user id.
///
/// The distinct-user set is bounded: once `max_users` is exceeded, the
/// least-recently-touched user's state is evicted.
pub struct MemoryStateStore {
    users: Mutex<HashMap<String, UserState>>,
    max_users: usize,
    touch_seq: AtomicU64,
}

impl MemoryStateStore {
    /// Create a store bounded to `max_users` distinct users
    pub fn new(max_users: usize) -> Self {
        info!("Creating in-memory state store (max {} users)", max_users);
        Self {
            users: Mutex::new(HashMap::new()),
            max_users,
            touch_seq: AtomicU64::new(0),
        }
    }

    /// Create a store with the default user bound
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MAX_USERS)
    }

    /// Run `f` against the user's state, creating it if absent and
    /// evicting the least-recently-touched user when over the bound.
    fn with_user<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserState) -> T,
    ) -> Result<T, StateStoreError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| StateStoreError::Backend(format!("Lock error: {}", e)))?;

        if !users.contains_key(user_id) && users.len() >= self.max_users {
            if let Some(stale) = users
                .iter()
                .min_by_key(|(_, state)| state.touched)
                .map(|(id, _)| id.clone())
            {
                debug!("Evicting state for stale user {}", stale);
                users.remove(&stale);
            }
        }

        let touched = self.touch_seq.fetch_add(1, Ordering::Relaxed);
        let state = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserState::new(touched));
        state.touched = touched;
        Ok(f(state))
    }

    /// Append an entry to the user's bounded audit list (newest first)
    pub fn push_recent(
        &self,
        user_id: &str,
        entry: Value,
        capacity: usize,
    ) -> Result<(), StateStoreError> {
        self.with_user(user_id, |state| {
            state.recent.push_front(entry);
            state.recent.truncate(capacity);
        })
    }

    /// Read up to `limit` audit entries for the user, newest first.
    /// Unknown users read as empty without materializing state.
    pub fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<Value>, StateStoreError> {
        let users = self
            .users
            .lock()
            .map_err(|e| StateStoreError::Backend(format!("Lock error: {}", e)))?;

        Ok(users
            .get(user_id)
            .map(|state| state.recent.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    /// Number of distinct users currently tracked
    pub fn user_count(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    /// Drop all state (for testing)
    pub fn clear(&self) {
        if let Ok(mut users) = self.users.lock() {
            users.clear();
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn push_and_trim(
        &self,
        user_id: &str,
        timestamp: DateTime<Utc>,
        capacity: usize,
    ) -> Result<Vec<DateTime<Utc>>, StateStoreError> {
        self.with_user(user_id, |state| state.window.push_and_trim(timestamp, capacity))
    }

    async fn last_location(&self, user_id: &str) -> Result<Option<String>, StateStoreError> {
        self.with_user(user_id, |state| state.location.clone())
    }

    async fn set_location(&self, user_id: &str, location: &str) -> Result<(), StateStoreError> {
        self.with_user(user_id, |state| {
            state.location = Some(location.to_string());
        })
    }
}
