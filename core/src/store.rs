//! Key/value store with optional per-key expiry.
//!
//! # Design
//! Each value is wrapped in a `StoredEntry` and kept as JSON text in a
//! `KeyValueBackend`. Expiry is lazy: nothing sweeps the backend, a read
//! that finds an expired entry deletes it and reports a miss. Reads are
//! fail-soft. Unreadable or corrupt entries come back as `None` and stay in
//! the backend. Writes surface backend errors.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::KeyValueBackend;
use crate::clock::{duration_millis, Clock, SystemClock};
use crate::error::StoreError;

/// A stored value and its absolute expiry in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: Value,
    pub expire: Option<u64>,
}

impl StoredEntry {
    /// Expired strictly after `expire`.
    pub fn is_expired(&self, now_millis: u64) -> bool {
        matches!(self.expire, Some(expire) if now_millis > expire)
    }
}

/// Expiring store over a backend and a clock.
#[derive(Debug)]
pub struct ExpiringStore<B, C = SystemClock> {
    backend: B,
    clock: C,
}

impl<B: KeyValueBackend> ExpiringStore<B, SystemClock> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock)
    }
}

impl<B: KeyValueBackend, C: Clock> ExpiringStore<B, C> {
    pub fn with_clock(backend: B, clock: C) -> Self {
        Self { backend, clock }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Store `value` under `key`, replacing any previous entry. `None` or a
    /// zero `ttl` never expires.
    pub fn set<V: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(StoreError::Serialization)?;
        let expire = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| self.clock.now_millis().saturating_add(duration_millis(ttl)));
        let text = serde_json::to_string(&StoredEntry { value, expire })
            .map_err(StoreError::Serialization)?;
        self.backend.set_item(key, text)
    }

    /// Read the value under `key` as `V`.
    ///
    /// Returns `None` when the key is absent, expired (the entry is removed),
    /// corrupt, or does not deserialize into `V`.
    pub fn get<V: DeserializeOwned>(&mut self, key: &str) -> Option<V> {
        let entry = self.entry(key)?;
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Read the raw entry under `key`, applying the same expiry and
    /// corruption rules as `get`.
    pub fn entry(&mut self, key: &str) -> Option<StoredEntry> {
        let text = match self.backend.get_item(key) {
            Ok(Some(text)) if !text.is_empty() => text,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read local storage");
                return None;
            }
        };

        let entry: StoredEntry = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read local storage");
                return None;
            }
        };

        if entry.is_expired(self.clock.now_millis()) {
            tracing::debug!(key, "evicting expired entry");
            if let Err(e) = self.backend.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to evict expired entry");
            }
            return None;
        }

        Some(entry)
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.backend.remove_item(key)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.backend.clear()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::clock::ManualClock;

    const START: u64 = 1_700_000_000_000;

    fn store() -> (ExpiringStore<MemoryBackend, ManualClock>, ManualClock) {
        let clock = ManualClock::new(START);
        (ExpiringStore::with_clock(MemoryBackend::new(), clock.clone()), clock)
    }

    #[test]
    fn set_then_get_without_ttl() {
        let (mut store, clock) = store();
        store.set("user", &json!({"name": "alice"}), None).unwrap();
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert_eq!(store.get::<Value>("user"), Some(json!({"name": "alice"})));
    }

    #[test]
    fn ttl_beyond_u64_millis_never_lapses() {
        let (mut store, clock) = store();
        store
            .set("k", "v", Some(Duration::from_secs(18_446_744_073_709_552)))
            .unwrap();
        let entry = store.entry("k").unwrap();
        assert_eq!(entry.expire, Some(u64::MAX));

        clock.advance(Duration::from_secs(3600));
        assert_eq!(store.get::<String>("k").as_deref(), Some("v"));
    }

    #[test]
    fn entry_is_written_with_absolute_expiry() {
        let (mut store, _clock) = store();
        store.set("token", "abc", Some(Duration::from_millis(500))).unwrap();
        let text = store.backend().get_item("token").unwrap().unwrap();
        let entry: StoredEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(entry.value, json!("abc"));
        assert_eq!(entry.expire, Some(START + 500));
    }

    #[test]
    fn value_is_served_until_expiry_instant() {
        let (mut store, clock) = store();
        store.set("token", "abc", Some(Duration::from_millis(500))).unwrap();
        clock.advance(Duration::from_millis(500));
        assert_eq!(store.get::<String>("token").as_deref(), Some("abc"));
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let (mut store, clock) = store();
        store.set("token", "abc", Some(Duration::from_millis(500))).unwrap();
        clock.advance(Duration::from_millis(501));
        assert_eq!(store.get::<String>("token"), None);
        assert!(!store.backend().contains_key("token"));
    }

    #[test]
    fn expired_entries_stay_until_read() {
        let (mut store, clock) = store();
        store.set("a", &1, Some(Duration::from_millis(10))).unwrap();
        store.set("b", &2, Some(Duration::from_millis(10))).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get::<i32>("a"), None);
        assert!(store.backend().contains_key("b"));
    }

    #[test]
    fn zero_ttl_never_expires() {
        let (mut store, clock) = store();
        store.set("pref", &true, Some(Duration::ZERO)).unwrap();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(store.get::<bool>("pref"), Some(true));
        assert_eq!(store.entry("pref").unwrap().expire, None);
    }

    #[test]
    fn set_overwrites_previous_entry() {
        let (mut store, clock) = store();
        store.set("k", "old", Some(Duration::from_millis(5))).unwrap();
        store.set("k", "new", None).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get::<String>("k").as_deref(), Some("new"));
    }

    #[test]
    fn remove_then_get_is_none() {
        let (mut store, _clock) = store();
        store.set("k", "v", None).unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get::<String>("k"), None);
        store.remove("never-set").unwrap();
        assert_eq!(store.get::<String>("never-set"), None);
    }

    #[test]
    fn clear_removes_every_key() {
        let (mut store, _clock) = store();
        for key in ["a", "b", "c"] {
            store.set(key, key, None).unwrap();
        }
        store.clear().unwrap();
        for key in ["a", "b", "c"] {
            assert_eq!(store.get::<String>(key), None);
        }
        assert!(store.backend().is_empty());
    }

    #[test]
    fn corrupt_entry_is_a_miss_and_left_in_place() {
        let mut backend = MemoryBackend::new();
        backend.set_item("broken", "{not json".to_string()).unwrap();
        let mut store = ExpiringStore::with_clock(backend, ManualClock::new(START));

        assert_eq!(store.get::<Value>("broken"), None);
        assert!(store.backend().contains_key("broken"));
    }

    #[test]
    fn empty_text_is_a_miss() {
        let mut backend = MemoryBackend::new();
        backend.set_item("blank", String::new()).unwrap();
        let mut store = ExpiringStore::with_clock(backend, ManualClock::new(START));
        assert_eq!(store.get::<Value>("blank"), None);
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let (mut store, _clock) = store();
        store.set("count", "not a number", None).unwrap();
        assert_eq!(store.get::<u32>("count"), None);
        assert_eq!(store.get::<String>("count").as_deref(), Some("not a number"));
    }

    #[test]
    fn reads_entries_written_by_other_clients() {
        let mut backend = MemoryBackend::new();
        backend
            .set_item("draft", r#"{"value":{"text":"hi"},"expire":null}"#.to_string())
            .unwrap();
        let mut store = ExpiringStore::with_clock(backend, ManualClock::new(START));
        assert_eq!(store.get::<Value>("draft"), Some(json!({"text": "hi"})));
    }
}
