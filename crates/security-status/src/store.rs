//! Single source of truth for the account's security status.
//!
//! Refresh pipeline:
//!
//! ```text
//! refresh() ──seq=N──> bounded backend fetch ──> apply only if N is newest
//!                                                 │
//!                success: replace snapshot, clear failure, notify listeners
//!                failure: keep last known-good snapshot, record the failure
//! ```
//!
//! Completions carry the sequence number they started with; a slow refresh
//! that resolves after a newer one has applied is discarded, so the snapshot
//! can only move forward.

use crate::status::AccountSecurityStatus;
use chrono::{DateTime, Utc};
use security_api::SecurityBackend;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Tunable bounds for status refreshes.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Overall bound on one refresh round-trip
    pub refresh_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            refresh_timeout: Duration::from_secs(15),
        }
    }
}

/// Why the latest refresh failed, with a remediation hint for UI surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub message: String,
    pub resolution: String,
}

/// Listener invoked with each newly applied snapshot.
pub type RefreshListener = Box<dyn Fn(&AccountSecurityStatus) + Send + Sync>;

struct StoreState {
    snapshot: Option<AccountSecurityStatus>,
    fetched_at: Option<DateTime<Utc>>,
    failure: Option<RefreshFailure>,
    last_applied_seq: u64,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns the authoritative [`AccountSecurityStatus`] snapshot.
///
/// All writes go through [`refresh`](Self::refresh); readers get clones of
/// the latest applied snapshot. A refresh failure never erases a previously
/// loaded snapshot.
pub struct SecurityStatusStore {
    backend: Arc<dyn SecurityBackend>,
    config: StoreConfig,
    state: Mutex<StoreState>,
    listeners: Mutex<Vec<RefreshListener>>,
    next_seq: AtomicU64,
    in_flight: AtomicUsize,
    attached: AtomicBool,
}

impl SecurityStatusStore {
    pub fn new(backend: Arc<dyn SecurityBackend>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            state: Mutex::new(StoreState {
                snapshot: None,
                fetched_at: None,
                failure: None,
                last_applied_seq: 0,
            }),
            listeners: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            attached: AtomicBool::new(false),
        }
    }

    /// Latest applied snapshot, or None before the first successful load.
    pub fn current(&self) -> Option<AccountSecurityStatus> {
        self.state.lock().unwrap().snapshot.clone()
    }

    /// When the current snapshot was fetched.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().fetched_at
    }

    /// Failure recorded by the most recent refresh, if it failed.
    pub fn last_failure(&self) -> Option<RefreshFailure> {
        self.state.lock().unwrap().failure.clone()
    }

    /// Whether any refresh is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Register a listener for newly applied snapshots.
    pub fn add_refresh_listener(&self, listener: RefreshListener) {
        self.listeners.lock().unwrap().push(listener);
    }

    /// Trigger the one-time initial refresh.
    ///
    /// Called when a consumer surface starts observing the store; repeated
    /// calls are no-ops.
    pub fn attach(self: &Arc<Self>) {
        if self.attached.swap(true, Ordering::AcqRel) {
            return;
        }
        let store = self.clone();
        tokio::spawn(async move {
            store.refresh().await;
        });
    }

    /// Fetch the authoritative status and apply it if still the newest.
    ///
    /// Never returns an error: failures are recorded and observable via
    /// [`last_failure`](Self::last_failure).
    pub async fn refresh(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let _guard = InFlightGuard(&self.in_flight);

        tracing::debug!(seq, "Refreshing account security status");

        let result = tokio::time::timeout(
            self.config.refresh_timeout,
            self.backend.fetch_security_status(),
        )
        .await;

        match result {
            Ok(Ok(response)) => {
                let snapshot = AccountSecurityStatus::from(response);
                let applied = {
                    let mut state = self.state.lock().unwrap();
                    if seq <= state.last_applied_seq {
                        tracing::debug!(seq, "Discarding superseded refresh result");
                        None
                    } else {
                        state.last_applied_seq = seq;
                        state.snapshot = Some(snapshot.clone());
                        state.fetched_at = Some(Utc::now());
                        state.failure = None;
                        Some(snapshot)
                    }
                };

                if let Some(snapshot) = applied {
                    tracing::info!(
                        seq,
                        method_count = snapshot.linked_method_count(),
                        "Applied security status snapshot"
                    );
                    self.notify_listeners(&snapshot);
                }
            }
            Ok(Err(error)) => {
                self.record_failure(seq, &error.to_string(), error.is_transient());
            }
            Err(_) => {
                self.record_failure(seq, "refresh timed out", true);
            }
        }
    }

    fn record_failure(&self, seq: u64, error_text: &str, transient: bool) {
        tracing::warn!(seq, error = %error_text, "Security status refresh failed");

        let failure = RefreshFailure {
            message: "Could not load your security settings.".to_string(),
            resolution: if transient {
                "Check your connection and try again.".to_string()
            } else {
                "Try again in a few minutes.".to_string()
            },
        };

        let mut state = self.state.lock().unwrap();
        if seq <= state.last_applied_seq {
            tracing::debug!(seq, "Discarding superseded refresh failure");
            return;
        }
        state.last_applied_seq = seq;
        state.failure = Some(failure);
    }

    fn notify_listeners(&self, snapshot: &AccountSecurityStatus) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.iter() {
            listener(snapshot);
        }
    }
}
