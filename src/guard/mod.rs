//! Login attempt guard.
//!
//! Counts consecutive failed sign-ins per client and blocks the client for
//! [`policy::LOCKOUT_DURATION`] once [`policy::MAX_FAILED_ATTEMPTS`] is
//! reached. The policy itself is pure; [`LoginGuard`] loads the client's
//! record, applies the policy and writes the result back.

pub mod policy;
pub mod record;
pub mod store;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use policy::{AttemptState, Check, GuardDecision};
use store::KeyValueStore;

pub struct LoginGuard {
    store: Box<dyn KeyValueStore>,
    // Last failure per storage key; open records carry no timestamp of their own.
    last_failure: HashMap<String, DateTime<Utc>>,
}

impl LoginGuard {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        LoginGuard {
            store,
            last_failure: HashMap::new(),
        }
    }

    /// Current state for `client`. Unreadable records are discarded and
    /// treated as no state.
    pub fn state(&mut self, client: &str) -> AttemptState {
        let key = record::storage_key(client);
        let Some(raw) = self.store.get(&key) else {
            return AttemptState::default();
        };

        match record::decode(&raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Discarding corrupt login attempt record for {}: {}", client, e);
                if let Err(e) = self.store.remove(&key) {
                    tracing::error!("Failed to remove login attempt record: {:?}", e);
                }
                AttemptState::default()
            }
        }
    }

    fn persist(&mut self, client: &str, state: &AttemptState) {
        let key = record::storage_key(client);
        let result = if state.is_empty() {
            self.last_failure.remove(&key);
            self.store.remove(&key)
        } else {
            record::encode(state).and_then(|value| self.store.set(&key, value))
        };
        if let Err(e) = result {
            tracing::error!("Failed to persist login attempt record for {}: {:?}", client, e);
        }
    }

    pub fn check_allowed(&mut self, client: &str, now: DateTime<Utc>) -> Check {
        let state = self.state(client);
        let (check, next) = policy::check_allowed(&state, now);
        if next != state {
            tracing::info!("Login lockout expired for {}", client);
            self.persist(client, &next);
        }
        check
    }

    pub fn record_failure(&mut self, client: &str, now: DateTime<Utc>) -> GuardDecision {
        let state = self.state(client);
        let (decision, next) = policy::apply_failure(&state, now);
        if next != state {
            self.last_failure.insert(record::storage_key(client), now);
            self.persist(client, &next);
        }

        match decision {
            GuardDecision::StillOpen { attempts_remaining } => {
                tracing::info!(
                    "Failed login from {} ({} attempts remaining)",
                    client,
                    attempts_remaining
                );
            }
            GuardDecision::Blocked { blocked_until, .. } => {
                tracing::warn!("Login blocked for {} until {}", client, blocked_until);
            }
        }
        decision
    }

    pub fn record_success(&mut self, client: &str) {
        self.persist(client, &policy::apply_success());
    }

    /// Drops records whose lockout has expired, open records with no failure
    /// in the last lockout window, and unreadable records. Open records loaded
    /// from disk are aged from the first purge that sees them. Returns the
    /// number of records removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let prefix = format!("{}:", record::STORAGE_KEY);
        let mut removed = 0;

        for key in self.store.keys() {
            if !key.starts_with(&prefix) {
                continue;
            }
            let stale = match self.store.get(&key).map(|raw| record::decode(&raw)) {
                None => continue,
                Some(Err(_)) => true,
                Some(Ok(state)) => match state.blocked_until {
                    Some(until) => now >= until,
                    None => {
                        let last = *self.last_failure.entry(key.clone()).or_insert(now);
                        now - last >= policy::lockout_delta()
                    }
                },
            };
            if !stale {
                continue;
            }
            self.last_failure.remove(&key);
            match self.store.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => tracing::error!("Failed to purge login attempt record {}: {:?}", key, e),
            }
        }

        self.last_failure.retain(|key, _| self.store.get(key).is_some());
        removed
    }
}
