use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::ResumeAnalyzer;
use crate::storage::AnalysisStore;
use crate::tailoring::session::TailoringSession;

/// Upper bound on retained sessions. The registry is in-memory only, so past
/// this the oldest sessions are evicted to keep it from growing without bound.
pub const MAX_SESSIONS: usize = 500;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable analyzer. Production: `LlmResumeAnalyzer` over the shared
    /// LLM client.
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    /// Best-effort persistence backend for analysis records.
    pub store: Arc<dyn AnalysisStore>,
    /// Live tailoring sessions. The write lock serializes apply/dismiss
    /// mutation — a session is never mutated from two call sites at once.
    pub sessions: Arc<RwLock<HashMap<Uuid, TailoringSession>>>,
}

/// Inserts a session into the registry, evicting the oldest sessions first
/// when the registry is at capacity.
pub fn insert_session(sessions: &mut HashMap<Uuid, TailoringSession>, session: TailoringSession) {
    while sessions.len() >= MAX_SESSIONS {
        let oldest = sessions
            .values()
            .min_by_key(|s| s.created_at)
            .map(|s| s.id);
        match oldest {
            Some(id) => {
                tracing::warn!("Session registry full; evicting oldest session {id}");
                sessions.remove(&id);
            }
            None => break,
        }
    }
    sessions.insert(session.id, session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_insert_session_below_cap_keeps_everything() {
        let mut sessions = HashMap::new();
        for _ in 0..3 {
            insert_session(&mut sessions, TailoringSession::new(Uuid::new_v4(), None));
        }
        assert_eq!(sessions.len(), 3);
    }

    #[test]
    fn test_insert_session_at_cap_evicts_oldest() {
        let mut sessions = HashMap::new();
        let mut oldest_id = None;
        for i in 0..MAX_SESSIONS {
            let mut session = TailoringSession::new(Uuid::new_v4(), None);
            session.created_at = Utc::now() - Duration::seconds((MAX_SESSIONS - i) as i64);
            if i == 0 {
                oldest_id = Some(session.id);
            }
            sessions.insert(session.id, session);
        }

        let newcomer = TailoringSession::new(Uuid::new_v4(), None);
        let newcomer_id = newcomer.id;
        insert_session(&mut sessions, newcomer);

        assert_eq!(sessions.len(), MAX_SESSIONS);
        assert!(!sessions.contains_key(&oldest_id.unwrap()));
        assert!(sessions.contains_key(&newcomer_id));
    }
}
