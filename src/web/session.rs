// Per-session dashboard state: the submission phase and the five most recent
// results. Keyed by the session ID baked into the signed cookie, so each
// browser session owns its own history and nothing is shared across users.
//
// Entries idle for longer than the cookie lifetime are pruned whenever a new
// session is created.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use super::auth::SESSION_TTL_SECS;
use crate::moderation::history::{RecentEntry, RecentResults};
use crate::moderation::state::{AnalysisInProgress, SubmissionPhase};
use crate::moderation::severity::UiState;

#[derive(Debug, Default)]
struct ClientSession {
    phase: SubmissionPhase,
    recent: RecentResults,
    last_seen: Option<Instant>,
}

/// Read-only view returned by GET /api/session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SubmissionPhase,
    pub recent: Vec<RecentEntry>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, ClientSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a session into Analyzing. Rejects a second concurrent submission.
    pub async fn begin(&self, session_id: &str) -> Result<(), AnalysisInProgress> {
        let mut sessions = self.inner.write().await;
        if !sessions.contains_key(session_id) {
            prune(&mut sessions);
        }
        let session = sessions.entry(session_id.to_string()).or_default();
        session.phase = session.phase.begin()?;
        session.last_seen = Some(Instant::now());
        Ok(())
    }

    /// Record a finished analysis and settle the phase on its display state.
    pub async fn complete(&self, session_id: &str, entry: RecentEntry, ui_state: UiState) {
        let mut sessions = self.inner.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();
        session.phase = session.phase.complete(ui_state);
        session.recent.push(entry);
        session.last_seen = Some(Instant::now());
    }

    /// The submission failed; return to Idle.
    pub async fn fail(&self, session_id: &str) {
        let mut sessions = self.inner.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.phase = session.phase.fail();
            session.last_seen = Some(Instant::now());
        }
    }

    pub async fn snapshot(&self, session_id: &str) -> SessionSnapshot {
        let sessions = self.inner.read().await;
        match sessions.get(session_id) {
            Some(session) => SessionSnapshot {
                phase: session.phase,
                recent: session.recent.iter().cloned().collect(),
            },
            None => SessionSnapshot {
                phase: SubmissionPhase::Idle,
                recent: Vec::new(),
            },
        }
    }

    /// Forget a session (logout).
    pub async fn remove(&self, session_id: &str) {
        self.inner.write().await.remove(session_id);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Guard that returns the session to Idle if it is dropped while armed.
    pub fn guard(&self, session_id: &str) -> AnalysisGuard {
        AnalysisGuard {
            store: self.clone(),
            session_id: session_id.to_string(),
            armed: true,
        }
    }
}

/// Held by a request between `begin` and its terminal transition.
///
/// A request future dropped mid-analysis (client gone, proxy timeout) never
/// reaches `complete` or `fail`; dropping the armed guard schedules the reset.
pub struct AnalysisGuard {
    store: SessionStore,
    session_id: String,
    armed: bool,
}

impl AnalysisGuard {
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AnalysisGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let store = self.store.clone();
        let session_id = std::mem::take(&mut self.session_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { store.fail(&session_id).await });
            }
            Err(_) => {
                if let Ok(mut sessions) = store.inner.try_write() {
                    if let Some(session) = sessions.get_mut(&session_id) {
                        session.phase = session.phase.fail();
                    }
                }
            }
        }
    }
}

fn prune(sessions: &mut HashMap<String, ClientSession>) {
    let ttl = Duration::from_secs(SESSION_TTL_SECS);
    sessions.retain(|_, s| s.last_seen.is_some_and(|seen| seen.elapsed() < ttl));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::severity::SeverityTier;

    fn entry(id: i64) -> RecentEntry {
        RecentEntry {
            analysis_id: Some(id),
            toxicity_score: 10,
            severity_level: SeverityTier::Low,
            ui_state: UiState::Safe,
            display_labels: vec!["Safe".to_string()],
            analyzed_at: String::new(),
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let store = SessionStore::new();
        store.begin("s1").await.unwrap();
        assert_eq!(store.snapshot("s1").await.phase, SubmissionPhase::Analyzing);
        assert!(store.begin("s1").await.is_err());

        store.complete("s1", entry(1), UiState::Safe).await;
        let snap = store.snapshot("s1").await;
        assert_eq!(snap.phase, SubmissionPhase::Safe);
        assert_eq!(snap.recent.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_resets_to_idle() {
        let store = SessionStore::new();
        store.begin("s1").await.unwrap();
        store.fail("s1").await;
        assert_eq!(store.snapshot("s1").await.phase, SubmissionPhase::Idle);
        assert!(store.begin("s1").await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_guard_resets_to_idle() {
        let store = SessionStore::new();
        store.begin("s1").await.unwrap();
        drop(store.guard("s1"));

        for _ in 0..50 {
            if store.snapshot("s1").await.phase == SubmissionPhase::Idle {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.snapshot("s1").await.phase, SubmissionPhase::Idle);
    }

    #[tokio::test]
    async fn test_disarmed_guard_keeps_the_outcome() {
        let store = SessionStore::new();
        store.begin("s1").await.unwrap();
        let guard = store.guard("s1");
        store.complete("s1", entry(1), UiState::Risk).await;
        guard.disarm();

        tokio::task::yield_now().await;
        assert_eq!(store.snapshot("s1").await.phase, SubmissionPhase::Risk);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_and_bounded() {
        let store = SessionStore::new();
        for id in 0..7 {
            store.begin("a").await.unwrap();
            store.complete("a", entry(id), UiState::Safe).await;
        }
        store.begin("b").await.unwrap();

        let a = store.snapshot("a").await;
        assert_eq!(a.recent.len(), 5);
        assert_eq!(a.recent[0].analysis_id, Some(6));
        assert!(store.snapshot("b").await.recent.is_empty());

        store.remove("a").await;
        assert_eq!(store.len().await, 1);
    }
}
