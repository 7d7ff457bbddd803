use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

struct CacheEntry<T> {
    value: Arc<T>,
    refreshed_at: DateTime<Utc>,
}

/// Single-entry cache with time-to-live expiry.
///
/// The slot mutex is held while a refresh runs, so concurrent callers on a
/// cold or expired cache wait for one computation instead of repeating it.
/// A refreshed value is fully built before it replaces the old `Arc`, and a
/// failed refresh leaves the slot untouched.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_refresh<E, F>(&self, refresh: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or_refresh_at(Utc::now(), refresh)
    }

    pub fn get_or_refresh_at<E, F>(&self, now: DateTime<Utc>, refresh: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        // Entries are only ever replaced whole, so a poisoned lock still
        // guards a consistent value.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = slot.as_ref() {
            if self.is_fresh(entry, now) {
                return Ok(Arc::clone(&entry.value));
            }
        }

        let value = Arc::new(refresh()?);
        *slot = Some(CacheEntry {
            value: Arc::clone(&value),
            refreshed_at: now,
        });
        Ok(value)
    }

    /// Time of the last successful refresh, if any.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|entry| entry.refreshed_at)
    }

    fn is_fresh(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(entry.refreshed_at);
        age >= Duration::zero() && age < self.ttl
    }
}
