//! Cacheable remote values with loading/success/error status
//!
//! A [`RemoteResource`] never performs I/O itself. Binding it to a key tells
//! the caller whether a fetch has to be issued; the caller later hands the
//! outcome back with [`RemoteResource::resolve`]. Outcomes are cached per key,
//! so switching back to a key already fetched is served from the cache, and an
//! outcome arriving for a key that is no longer current never changes what the
//! current key reports.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// A failed fetch, kept in the resource for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchError {
    /// Human readable reason
    pub message: String,
    /// HTTP status, when the server answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<&Error> for FetchError {
    fn from(err: &Error) -> Self {
        let status = match err {
            Error::ApiError { status, .. } => Some(*status),
            Error::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };
        Self {
            message: err.to_string(),
            status,
        }
    }
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

/// Status of the resource's current key
#[derive(Debug, Clone)]
pub enum ResourceState<T> {
    /// No key, fetching disabled, or nothing requested yet
    Idle,
    /// First fetch for the key is in flight
    Loading,
    Success(Arc<T>),
    Error(FetchError),
}

impl<T> ResourceState<T> {
    /// Short status name, as shown to the view
    pub fn label(&self) -> &'static str {
        match self {
            ResourceState::Idle => "idle",
            ResourceState::Loading => "loading",
            ResourceState::Success(_) => "success",
            ResourceState::Error(_) => "error",
        }
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    data: Option<Arc<T>>,
    error: Option<FetchError>,
    updated_at: Option<DateTime<Utc>>,
    in_flight: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            updated_at: None,
            in_flight: false,
        }
    }
}

/// A remote value addressed by cache key `K`
#[derive(Debug)]
pub struct RemoteResource<K, T> {
    name: &'static str,
    key: Option<K>,
    enabled: bool,
    entries: HashMap<K, CacheEntry<T>>,
}

impl<K, T> RemoteResource<K, T>
where
    K: Clone + Eq + Hash + Debug,
{
    /// Create an unbound resource; `name` only appears in logs
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            enabled: false,
            entries: HashMap::new(),
        }
    }

    /// Point the resource at `key`.
    ///
    /// Returns the key to fetch when a fetch must be issued: the resource is
    /// enabled, nothing is cached for the key and no fetch for it is in flight.
    /// A cached failure is retried only when the key changed.
    pub fn bind(&mut self, key: Option<K>, enabled: bool) -> Option<K> {
        let key_changed = self.key != key;
        if key_changed {
            debug!("{}: key changed to {:?}", self.name, key);
        }
        self.key = key;
        self.enabled = enabled;

        let key = self.key.clone()?;
        if !enabled {
            return None;
        }

        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight || entry.data.is_some() {
            return None;
        }
        if entry.error.is_some() && !key_changed {
            return None;
        }

        entry.in_flight = true;
        debug!("{}: fetching {:?}", self.name, key);
        Some(key)
    }

    /// Fetch the current key again, keeping cached data visible meanwhile
    pub fn refetch(&mut self) -> Option<K> {
        if !self.enabled {
            return None;
        }
        let key = self.key.clone()?;
        let entry = self.entries.entry(key.clone()).or_default();
        if entry.in_flight {
            return None;
        }

        entry.in_flight = true;
        debug!("{}: refetching {:?}", self.name, key);
        Some(key)
    }

    /// Record the outcome of a fetch for `key`.
    ///
    /// Returns `true` when the outcome belongs to the current key. Outcomes
    /// for keys without an outstanding fetch are dropped.
    pub fn resolve(&mut self, key: &K, outcome: Result<T, FetchError>) -> bool {
        let Some(entry) = self.entries.get_mut(key).filter(|e| e.in_flight) else {
            debug!("{}: dropping unexpected response for {:?}", self.name, key);
            return false;
        };

        entry.in_flight = false;
        match outcome {
            Ok(value) => {
                entry.data = Some(Arc::new(value));
                entry.error = None;
                entry.updated_at = Some(Utc::now());
            }
            Err(err) => {
                debug!("{}: fetch for {:?} failed: {}", self.name, key, err);
                entry.error = Some(err);
            }
        }

        let current = self.key.as_ref() == Some(key);
        if !current {
            debug!("{}: cached stale response for {:?}", self.name, key);
        }
        current
    }

    fn current_entry(&self) -> Option<&CacheEntry<T>> {
        self.key.as_ref().and_then(|k| self.entries.get(k))
    }

    /// Status of the current key
    pub fn state(&self) -> ResourceState<T> {
        let Some(entry) = self.current_entry() else {
            return ResourceState::Idle;
        };

        if entry.in_flight {
            return match &entry.data {
                Some(data) => ResourceState::Success(Arc::clone(data)),
                None => ResourceState::Loading,
            };
        }
        match (&entry.error, &entry.data) {
            (Some(err), _) => ResourceState::Error(err.clone()),
            (None, Some(data)) => ResourceState::Success(Arc::clone(data)),
            (None, None) => ResourceState::Idle,
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state(), ResourceState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state(), ResourceState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.state(), ResourceState::Error(_))
    }

    /// Whether any fetch for the current key is in flight, refetches included
    pub fn is_fetching(&self) -> bool {
        self.current_entry().is_some_and(|e| e.in_flight)
    }

    /// Last successfully fetched value for the current key
    pub fn data(&self) -> Option<&T> {
        self.current_entry()
            .and_then(|e| e.data.as_deref())
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.current_entry().and_then(|e| e.error.as_ref())
    }

    /// When the current key last fetched successfully
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.current_entry().and_then(|e| e.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> RemoteResource<String, u32> {
        RemoteResource::new("test")
    }

    #[test]
    fn test_idle_until_bound() {
        let mut res = resource();
        assert!(matches!(res.state(), ResourceState::Idle));
        assert_eq!(res.bind(None, true), None);
        assert!(matches!(res.state(), ResourceState::Idle));
    }

    #[test]
    fn test_disabled_does_not_fetch() {
        let mut res = resource();
        assert_eq!(res.bind(Some("a".to_string()), false), None);
        assert!(matches!(res.state(), ResourceState::Idle));

        assert_eq!(res.bind(Some("a".to_string()), true), Some("a".to_string()));
        assert!(res.is_loading());
    }

    #[test]
    fn test_success_flow() {
        let mut res = resource();
        let key = res.bind(Some("a".to_string()), true).unwrap();
        assert!(res.is_loading());

        assert!(res.resolve(&key, Ok(7)));
        assert!(res.is_success());
        assert_eq!(res.data(), Some(&7));
        assert!(res.updated_at().is_some());
    }

    #[test]
    fn test_one_fetch_in_flight_per_key() {
        let mut res = resource();
        assert!(res.bind(Some("a".to_string()), true).is_some());
        assert!(res.bind(Some("a".to_string()), true).is_none());
        assert!(res.refetch().is_none());
    }

    #[test]
    fn test_cached_key_is_not_refetched() {
        let mut res = resource();
        let a = res.bind(Some("a".to_string()), true).unwrap();
        res.resolve(&a, Ok(1));

        let b = res.bind(Some("b".to_string()), true).unwrap();
        res.resolve(&b, Ok(2));

        assert_eq!(res.bind(Some("a".to_string()), true), None);
        assert_eq!(res.data(), Some(&1));
    }

    #[test]
    fn test_stale_response_does_not_touch_current_key() {
        let mut res = resource();
        let a = res.bind(Some("a".to_string()), true).unwrap();
        let b = res.bind(Some("b".to_string()), true).unwrap();

        assert!(!res.resolve(&a, Ok(1)));
        assert!(res.is_loading());
        assert_eq!(res.data(), None);

        assert!(res.resolve(&b, Ok(2)));
        assert_eq!(res.data(), Some(&2));

        assert_eq!(res.bind(Some(a), true), None);
        assert_eq!(res.data(), Some(&1));
    }

    #[test]
    fn test_unexpected_response_is_dropped() {
        let mut res = resource();
        let key = "nobody-asked".to_string();
        assert!(!res.resolve(&key, Ok(1)));
        assert_eq!(res.bind(Some(key.clone()), true), Some(key));
        assert!(res.is_loading());
    }

    #[test]
    fn test_error_is_not_retried_automatically() {
        let mut res = resource();
        let a = res.bind(Some("a".to_string()), true).unwrap();
        res.resolve(&a, Err(FetchError::new("boom")));

        assert!(res.is_error());
        assert_eq!(res.error().map(|e| e.message.as_str()), Some("boom"));
        assert_eq!(res.bind(Some("a".to_string()), true), None);

        // explicit refetch retries
        assert_eq!(res.refetch(), Some("a".to_string()));
        assert!(res.is_loading());
        res.resolve(&a, Ok(3));
        assert!(res.is_success());
        assert!(res.error().is_none());
    }

    #[test]
    fn test_refetch_keeps_data_visible() {
        let mut res = resource();
        let a = res.bind(Some("a".to_string()), true).unwrap();
        res.resolve(&a, Ok(1));

        assert_eq!(res.refetch(), Some("a".to_string()));
        assert!(res.is_success());
        assert!(res.is_fetching());

        res.resolve(&a, Err(FetchError::new("gone")));
        assert!(res.is_error());
        assert_eq!(res.data(), Some(&1));
    }

    #[test]
    fn test_fetch_error_from_api_error() {
        let err = Error::ApiError {
            status: 404,
            message: "not found".to_string(),
        };
        let fetch_error = FetchError::from(&err);
        assert_eq!(fetch_error.status, Some(404));
        assert!(fetch_error.to_string().contains("HTTP 404"));
    }
}
