// src/core/session.rs — In-memory session store and progress façade

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use super::types::BatchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error)
    }
}

/// Point-in-time view of a session, cloned out of the store so pollers
/// never observe a torn write.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub status: SessionStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BatchResult>,
    pub created_at: DateTime<Utc>,
}

struct Session {
    snapshot: SessionSnapshot,
    cancelled: Arc<AtomicBool>,
}

/// Process-wide map of session id to mutable session state. One writer
/// (the background worker) and any number of concurrent pollers.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes as i64),
        }
    }

    /// Create a new pending session and return its id. Also prunes
    /// expired terminal sessions so the map cannot grow without bound.
    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());

        let cutoff = Utc::now() - self.ttl;
        sessions.retain(|_, s| {
            !(s.snapshot.status.is_terminal() && s.snapshot.created_at < cutoff)
        });

        sessions.insert(
            id.clone(),
            Session {
                snapshot: SessionSnapshot {
                    id: id.clone(),
                    status: SessionStatus::Pending,
                    progress: 0,
                    message: "Analysis queued".into(),
                    result: None,
                    created_at: Utc::now(),
                },
                cancelled: Arc::new(AtomicBool::new(false)),
            },
        );
        id
    }

    /// O(1) snapshot lookup; None when the id is unknown or evicted.
    pub fn get(&self, id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).map(|s| s.snapshot.clone())
    }

    /// Update progress and message. No-op once the session is terminal;
    /// progress is clamped non-decreasing.
    pub fn update(&self, id: &str, progress: u8, message: impl Into<String>) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = sessions.get_mut(id) {
            if s.snapshot.status.is_terminal() {
                return;
            }
            s.snapshot.status = SessionStatus::Running;
            s.snapshot.progress = s.snapshot.progress.max(progress.min(100));
            s.snapshot.message = message.into();
        }
    }

    /// Transition to a terminal status and attach the result. Further
    /// updates and finalizes are ignored.
    pub fn finalize(
        &self,
        id: &str,
        status: SessionStatus,
        message: impl Into<String>,
        result: Option<BatchResult>,
    ) {
        debug_assert!(status.is_terminal());
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = sessions.get_mut(id) {
            if s.snapshot.status.is_terminal() {
                return;
            }
            s.snapshot.status = status;
            if status == SessionStatus::Complete {
                s.snapshot.progress = 100;
            }
            s.snapshot.message = message.into();
            s.snapshot.result = result;
        }
    }

    /// Request cancellation. Returns false if the session is unknown or
    /// already terminal. The worker observes the flag at the next unit
    /// boundary.
    pub fn cancel(&self, id: &str) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        match sessions.get(id) {
            Some(s) if !s.snapshot.status.is_terminal() => {
                s.cancelled.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    fn cancel_flag(&self, id: &str) -> Option<Arc<AtomicBool>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).map(|s| Arc::clone(&s.cancelled))
    }
}

/// Thin façade the worker uses to push status into the store for one
/// session, without carrying the id through every call site.
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<SessionStore>,
    session_id: String,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new(store: Arc<SessionStore>, session_id: String) -> Self {
        let cancelled = store
            .cancel_flag(&session_id)
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
        Self {
            store,
            session_id,
            cancelled,
        }
    }

    pub fn update(&self, progress: u8, message: impl Into<String>) {
        self.store.update(&self.session_id, progress, message);
    }

    pub fn complete(&self, result: BatchResult) {
        self.store.finalize(
            &self.session_id,
            SessionStatus::Complete,
            "Analysis complete",
            Some(result),
        );
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.store
            .finalize(&self.session_id, SessionStatus::Error, message, None);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BatchResult, RepoResult, RepoTarget};

    fn empty_batch() -> BatchResult {
        BatchResult {
            repos: vec![],
            total_issues: 0,
            total_hours: 0.0,
            total_cost: 0.0,
            hourly_rate: 80.0,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new(60);
        let id = store.create();
        let snap = store.get(&id).unwrap();
        assert_eq!(snap.status, SessionStatus::Pending);
        assert_eq!(snap.progress, 0);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let store = SessionStore::new(60);
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_update_moves_to_running_and_is_monotonic() {
        let store = SessionStore::new(60);
        let id = store.create();
        store.update(&id, 40, "working");
        assert_eq!(store.get(&id).unwrap().status, SessionStatus::Running);
        assert_eq!(store.get(&id).unwrap().progress, 40);

        // A lower value must not move progress backwards
        store.update(&id, 10, "still working");
        assert_eq!(store.get(&id).unwrap().progress, 40);
        assert_eq!(store.get(&id).unwrap().message, "still working");
    }

    #[test]
    fn test_finalize_is_sticky() {
        let store = SessionStore::new(60);
        let id = store.create();
        store.finalize(&id, SessionStatus::Complete, "done", Some(empty_batch()));

        let first = store.get(&id).unwrap();
        assert_eq!(first.status, SessionStatus::Complete);
        assert_eq!(first.progress, 100);

        // Later writes are ignored
        store.update(&id, 50, "zombie update");
        store.finalize(&id, SessionStatus::Error, "zombie finalize", None);
        let second = store.get(&id).unwrap();
        assert_eq!(second.status, SessionStatus::Complete);
        assert_eq!(second.message, "done");
        assert!(second.result.is_some());
    }

    #[test]
    fn test_terminal_snapshot_idempotent() {
        let store = SessionStore::new(60);
        let id = store.create();
        let target = RepoTarget {
            url: "https://github.com/acme/widgets".into(),
            owner: "acme".into(),
            name: "widgets".into(),
        };
        let batch = BatchResult {
            repos: vec![RepoResult::success(&target, vec![])],
            total_issues: 0,
            total_hours: 0.0,
            total_cost: 0.0,
            hourly_rate: 50.0,
        };
        store.finalize(&id, SessionStatus::Complete, "done", Some(batch));

        let a = serde_json::to_string(&store.get(&id).unwrap()).unwrap();
        let b = serde_json::to_string(&store.get(&id).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancel_only_live_sessions() {
        let store = SessionStore::new(60);
        let id = store.create();
        assert!(store.cancel(&id));

        let reporter = ProgressReporter::new(Arc::new(SessionStore::new(60)), "missing".into());
        assert!(!reporter.is_cancelled());

        store.finalize(&id, SessionStatus::Error, "cancelled", None);
        assert!(!store.cancel(&id));
        assert!(!store.cancel("unknown"));
    }

    #[test]
    fn test_reporter_sees_cancel_flag() {
        let store = Arc::new(SessionStore::new(60));
        let id = store.create();
        let reporter = ProgressReporter::new(Arc::clone(&store), id.clone());
        assert!(!reporter.is_cancelled());
        store.cancel(&id);
        assert!(reporter.is_cancelled());
    }

    #[test]
    fn test_ttl_prunes_only_expired_terminal_sessions() {
        let store = SessionStore::new(0); // everything terminal is instantly expired
        let done = store.create();
        store.finalize(&done, SessionStatus::Complete, "done", None);
        let live = store.create();

        // A later create prunes `done` but keeps the running session
        std::thread::sleep(std::time::Duration::from_millis(5));
        let _third = store.create();
        assert!(store.get(&done).is_none());
        assert!(store.get(&live).is_some());
    }
}
