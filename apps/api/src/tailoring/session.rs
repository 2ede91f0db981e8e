//! Tailoring session controller.
//!
//! Owns the working copy of the resume document and the review bookkeeping
//! for one upload → analyzing → tailoring → preview pass. The state machine
//! itself is synchronous and fully unit-testable; the async orchestration
//! (`run_analysis`, `persist_completion`) layers the analyzer and store on top.
//!
//! Persistence is best-effort throughout: a storage failure is logged at warn
//! and the in-memory session continues as the source of truth.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisOutcome, ResumeAnalyzer};
use crate::errors::AppError;
use crate::models::recommendation::{Recommendation, RecommendationStatus};
use crate::models::resume::ResumeDocument;
use crate::storage::{AnalysisPatch, AnalysisStore, SaveAnalysisRequest};
use crate::tailoring::engine;

/// Where a session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Upload,
    Analyzing,
    Tailoring,
    Preview,
}

#[derive(Debug, Clone)]
pub struct TailoringSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cv_upload_id: Option<String>,
    /// Storage record id, set once `save_analysis` succeeds.
    pub match_id: Option<String>,
    pub phase: Phase,
    pub document: ResumeDocument,
    pub jd_text: String,
    pub recommendations: Vec<Recommendation>,
    /// Applied ∪ dismissed. Only grows.
    processed: HashSet<String>,
    /// Applied ids in application order (subset of `processed`).
    applied: Vec<String>,
    pub last_error: Option<String>,
}

impl TailoringSession {
    pub fn new(user_id: Uuid, cv_upload_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            cv_upload_id,
            match_id: None,
            phase: Phase::Upload,
            document: ResumeDocument::default(),
            jd_text: String::new(),
            recommendations: Vec::new(),
            processed: HashSet::new(),
            applied: Vec::new(),
            last_error: None,
        }
    }

    /// upload → analyzing. Rejected from any other phase.
    pub fn begin_analysis(&mut self) -> Result<(), AppError> {
        if self.phase != Phase::Upload {
            return Err(AppError::Validation(format!(
                "Cannot start analysis from the {:?} phase",
                self.phase
            )));
        }
        self.phase = Phase::Analyzing;
        self.last_error = None;
        Ok(())
    }

    /// analyzing → tailoring (recommendations present) or → preview (none).
    /// The previous analysis result, if any, is discarded wholesale.
    pub fn accept_analysis(&mut self, outcome: AnalysisOutcome) {
        self.document = outcome.resume;
        self.jd_text = outcome.jd_text;
        self.recommendations = outcome.recommendations;
        self.processed.clear();
        self.applied.clear();
        self.phase = if self.recommendations.is_empty() {
            Phase::Preview
        } else {
            Phase::Tailoring
        };
    }

    /// analyzing → upload, recording the user-visible failure message.
    pub fn fail_analysis(&mut self, message: String) {
        self.phase = Phase::Upload;
        self.last_error = Some(message);
    }

    /// Applies a pending recommendation to the working document.
    pub fn apply_recommendation(&mut self, recommendation_id: &str) -> Result<(), AppError> {
        if self.phase != Phase::Tailoring {
            return Err(AppError::Validation(
                "Recommendations can only be applied in the tailoring phase".to_string(),
            ));
        }
        let rec = self.find_pending(recommendation_id)?.clone();
        self.document = engine::apply(&self.document, &rec);
        self.processed.insert(rec.id.clone());
        self.applied.push(rec.id);
        Ok(())
    }

    /// Marks a pending recommendation dismissed. Bookkeeping only; the
    /// document is untouched.
    pub fn dismiss_recommendation(&mut self, recommendation_id: &str) -> Result<(), AppError> {
        if self.phase != Phase::Tailoring {
            return Err(AppError::Validation(
                "Recommendations can only be dismissed in the tailoring phase".to_string(),
            ));
        }
        let id = self.find_pending(recommendation_id)?.id.clone();
        self.processed.insert(id);
        Ok(())
    }

    /// tailoring → preview. Allowed with recommendations still pending; the
    /// user may finish reviewing early. Returns the snapshot the caller
    /// persists AFTER releasing any lock guarding this session.
    pub fn finish_tailoring(&mut self) -> Result<CompletionSnapshot, AppError> {
        if self.phase != Phase::Tailoring {
            return Err(AppError::Validation(format!(
                "Cannot complete from the {:?} phase",
                self.phase
            )));
        }
        self.phase = Phase::Preview;
        Ok(CompletionSnapshot {
            session_id: self.id,
            match_id: self.match_id.clone(),
            user_id: self.user_id,
            document: self.document.clone(),
            recommendations: self.recommendations.clone(),
            applied: self.applied.clone(),
        })
    }

    /// preview → tailoring, the only backward transition. Available only when
    /// the analysis produced recommendations.
    pub fn reopen(&mut self) -> Result<(), AppError> {
        if self.phase != Phase::Preview {
            return Err(AppError::Validation(format!(
                "Cannot reopen from the {:?} phase",
                self.phase
            )));
        }
        if self.recommendations.is_empty() {
            return Err(AppError::Validation(
                "Nothing to review: the analysis produced no recommendations".to_string(),
            ));
        }
        self.phase = Phase::Tailoring;
        Ok(())
    }

    pub fn status_of(&self, recommendation_id: &str) -> RecommendationStatus {
        if self.applied.iter().any(|id| id == recommendation_id) {
            RecommendationStatus::Applied
        } else if self.processed.contains(recommendation_id) {
            RecommendationStatus::Dismissed
        } else {
            RecommendationStatus::Pending
        }
    }

    pub fn applied_ids(&self) -> &[String] {
        &self.applied
    }

    /// Recommendations not yet applied or dismissed.
    pub fn pending_count(&self) -> usize {
        self.recommendations
            .iter()
            .filter(|r| !self.processed.contains(&r.id))
            .count()
    }

    /// The completion check: every recommendation has been processed.
    pub fn is_fully_reviewed(&self) -> bool {
        self.pending_count() == 0
    }

    fn find_pending(&self, recommendation_id: &str) -> Result<&Recommendation, AppError> {
        let rec = self
            .recommendations
            .iter()
            .find(|r| r.id == recommendation_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Recommendation {recommendation_id} not found"))
            })?;
        if self.processed.contains(&rec.id) {
            return Err(AppError::Validation(format!(
                "Recommendation {recommendation_id} has already been processed"
            )));
        }
        Ok(rec)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Async orchestration
// ────────────────────────────────────────────────────────────────────────────

/// Runs the analysis step for a session: invokes the analyzer exactly once
/// and records the outcome (or failure) on the session. On success the fresh
/// analysis is persisted best-effort.
pub async fn run_analysis(
    session: &mut TailoringSession,
    analyzer: &dyn ResumeAnalyzer,
    store: &Arc<dyn AnalysisStore>,
    resume_text: &str,
    job_description: Option<&str>,
    jd_source: &str,
) -> Result<(), AppError> {
    session.begin_analysis()?;

    let outcome = match analyzer.analyze(resume_text, job_description).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = e.to_string();
            warn!("Analysis failed for session {}: {message}", session.id);
            session.fail_analysis(message.clone());
            return Err(AppError::Analysis(message));
        }
    };

    let analysis_value = serde_json::to_value(&outcome).unwrap_or_default();
    session.accept_analysis(outcome);
    info!(
        "Session {} analyzed: {} recommendations, phase {:?}",
        session.id,
        session.recommendations.len(),
        session.phase
    );

    let request = SaveAnalysisRequest {
        user_id: session.user_id,
        cv_upload_id: session.cv_upload_id.clone(),
        jd_text: session.jd_text.clone(),
        jd_source: jd_source.to_string(),
        jd_metadata: serde_json::json!({ "length": session.jd_text.len() }),
        analysis: analysis_value,
    };
    match store.save_analysis(request).await {
        Ok(record) => session.match_id = Some(record.id),
        Err(e) => warn!(
            "Persisting analysis for session {} failed (continuing): {e}",
            session.id
        ),
    }

    Ok(())
}

/// Everything completion persists, detached from the live session so the
/// caller can run the storage call without holding the session registry lock.
#[derive(Debug, Clone)]
pub struct CompletionSnapshot {
    pub session_id: Uuid,
    pub match_id: Option<String>,
    pub user_id: Uuid,
    pub document: ResumeDocument,
    pub recommendations: Vec<Recommendation>,
    pub applied: Vec<String>,
}

/// Persists a completed tailoring pass best-effort: the tailored document and
/// the applied id list. Failures are logged and swallowed.
pub async fn persist_completion(store: &Arc<dyn AnalysisStore>, snapshot: CompletionSnapshot) {
    let Some(match_id) = snapshot.match_id else {
        // The original save never landed; nothing to update against.
        warn!(
            "Session {} completed without a stored analysis record",
            snapshot.session_id
        );
        return;
    };

    let patch = AnalysisPatch {
        resume_data: serde_json::to_value(&snapshot.document).ok(),
        applied_recommendations: Some(snapshot.applied),
        recommendations: serde_json::to_value(&snapshot.recommendations).ok(),
    };
    if let Err(e) = store
        .update_analysis(&match_id, snapshot.user_id, patch)
        .await
    {
        warn!(
            "Persisting tailored resume for session {} failed (continuing): {e}",
            snapshot.session_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::recommendation::RecommendationKind;
    use crate::storage::{AnalysisRecord, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn outcome_with(recs: Vec<Recommendation>) -> AnalysisOutcome {
        AnalysisOutcome {
            resume: ResumeDocument {
                full_name: "Jane Doe".to_string(),
                skills: vec!["SQL".to_string()],
                ..Default::default()
            },
            recommendations: recs,
            jd_text: "Rust engineer".to_string(),
        }
    }

    fn skill_rec(id: &str, suggested: &str) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            kind: RecommendationKind::Skill,
            current: String::new(),
            suggested: suggested.to_string(),
            reason: "test".to_string(),
            target_index: None,
        }
    }

    struct StubAnalyzer {
        result: Mutex<Option<Result<AnalysisOutcome, LlmError>>>,
    }

    impl StubAnalyzer {
        fn ok(outcome: AnalysisOutcome) -> Self {
            Self {
                result: Mutex::new(Some(Ok(outcome))),
            }
        }
        fn err(error: LlmError) -> Self {
            Self {
                result: Mutex::new(Some(Err(error))),
            }
        }
    }

    #[async_trait]
    impl ResumeAnalyzer for StubAnalyzer {
        async fn analyze(
            &self,
            _resume_text: &str,
            _job_description: Option<&str>,
        ) -> Result<AnalysisOutcome, LlmError> {
            self.result.lock().unwrap().take().expect("single call")
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        saves: Mutex<Vec<SaveAnalysisRequest>>,
        updates: Mutex<Vec<(String, AnalysisPatch)>>,
        fail: bool,
    }

    #[async_trait]
    impl AnalysisStore for RecordingStore {
        async fn save_analysis(
            &self,
            request: SaveAnalysisRequest,
        ) -> Result<AnalysisRecord, StoreError> {
            if self.fail {
                return Err(StoreError::Api {
                    status: 503,
                    message: "storage down".to_string(),
                });
            }
            self.saves.lock().unwrap().push(request);
            Ok(AnalysisRecord {
                id: "match-1".to_string(),
                user_id: None,
            })
        }

        async fn update_analysis(
            &self,
            match_id: &str,
            _user_id: Uuid,
            patch: AnalysisPatch,
        ) -> Result<AnalysisRecord, StoreError> {
            if self.fail {
                return Err(StoreError::Api {
                    status: 503,
                    message: "storage down".to_string(),
                });
            }
            self.updates
                .lock()
                .unwrap()
                .push((match_id.to_string(), patch));
            Ok(AnalysisRecord {
                id: match_id.to_string(),
                user_id: None,
            })
        }
    }

    fn store(fail: bool) -> Arc<dyn AnalysisStore> {
        Arc::new(RecordingStore {
            fail,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_analysis_with_recommendations_enters_tailoring() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        let analyzer = StubAnalyzer::ok(outcome_with(vec![skill_rec("r1", "Rust")]));
        run_analysis(&mut session, &analyzer, &store(false), "resume", Some("jd"), "paste")
            .await
            .unwrap();
        assert_eq!(session.phase, Phase::Tailoring);
        assert_eq!(session.match_id.as_deref(), Some("match-1"));
    }

    #[tokio::test]
    async fn test_zero_recommendations_skips_straight_to_preview() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        let analyzer = StubAnalyzer::ok(outcome_with(vec![]));
        run_analysis(&mut session, &analyzer, &store(false), "resume", None, "paste")
            .await
            .unwrap();
        assert_eq!(session.phase, Phase::Preview);
    }

    #[tokio::test]
    async fn test_analysis_failure_returns_to_upload_with_message() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        let analyzer = StubAnalyzer::err(LlmError::EmptyContent);
        let err = run_analysis(&mut session, &analyzer, &store(false), "resume", None, "paste")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Analysis(_)));
        assert_eq!(session.phase, Phase::Upload);
        assert!(session.last_error.as_deref().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn test_storage_failure_during_analysis_is_swallowed() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        let analyzer = StubAnalyzer::ok(outcome_with(vec![skill_rec("r1", "Rust")]));
        run_analysis(&mut session, &analyzer, &store(true), "resume", Some("jd"), "paste")
            .await
            .unwrap();
        assert_eq!(session.phase, Phase::Tailoring);
        assert!(session.match_id.is_none());
    }

    #[tokio::test]
    async fn test_complete_persists_document_and_applied_ids() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![
            skill_rec("r1", "Rust"),
            skill_rec("r2", "Kubernetes"),
        ]));
        session.match_id = Some("match-1".to_string());
        session.apply_recommendation("r1").unwrap();
        session.dismiss_recommendation("r2").unwrap();

        let snapshot = session.finish_tailoring().unwrap();
        assert_eq!(session.phase, Phase::Preview);

        let recording = Arc::new(RecordingStore::default());
        let as_store: Arc<dyn AnalysisStore> = recording.clone();
        persist_completion(&as_store, snapshot).await;

        let updates = recording.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        let (match_id, patch) = &updates[0];
        assert_eq!(match_id, "match-1");
        assert_eq!(
            patch.applied_recommendations.as_deref(),
            Some(&["r1".to_string()][..])
        );
        assert!(patch.resume_data.is_some());
    }

    #[tokio::test]
    async fn test_complete_storage_failure_still_reaches_preview() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        session.match_id = Some("match-1".to_string());
        let snapshot = session.finish_tailoring().unwrap();
        persist_completion(&store(true), snapshot).await;
        assert_eq!(session.phase, Phase::Preview);
    }

    #[test]
    fn test_snapshot_carries_applied_ids_and_document() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        session.match_id = Some("match-1".to_string());
        session.apply_recommendation("r1").unwrap();
        let snapshot = session.finish_tailoring().unwrap();
        assert_eq!(snapshot.session_id, session.id);
        assert_eq!(snapshot.match_id.as_deref(), Some("match-1"));
        assert_eq!(snapshot.applied, vec!["r1".to_string()]);
        assert_eq!(snapshot.document, session.document);
    }

    #[test]
    fn test_apply_updates_document_and_status() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        session.apply_recommendation("r1").unwrap();
        assert!(session.document.skills.contains(&"Rust".to_string()));
        assert_eq!(session.status_of("r1"), RecommendationStatus::Applied);
        assert!(session.is_fully_reviewed());
    }

    #[test]
    fn test_processed_recommendation_cannot_be_reprocessed() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        session.dismiss_recommendation("r1").unwrap();
        assert_eq!(session.status_of("r1"), RecommendationStatus::Dismissed);
        assert!(matches!(
            session.apply_recommendation("r1"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            session.dismiss_recommendation("r1"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_dismiss_leaves_document_untouched() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        let before = session.document.clone();
        session.dismiss_recommendation("r1").unwrap();
        assert_eq!(session.document, before);
    }

    #[test]
    fn test_unknown_recommendation_is_not_found() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        assert!(matches!(
            session.apply_recommendation("nope"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_reopen_only_from_preview_with_recommendations() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        assert!(session.reopen().is_err()); // still tailoring

        session.finish_tailoring().unwrap();
        session.reopen().unwrap();
        assert_eq!(session.phase, Phase::Tailoring);
    }

    #[test]
    fn test_reopen_rejected_when_no_recommendations_existed() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![]));
        assert_eq!(session.phase, Phase::Preview);
        assert!(matches!(session.reopen(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_begin_analysis_only_from_upload() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.begin_analysis().unwrap();
        assert!(session.begin_analysis().is_err());
    }

    #[test]
    fn test_reanalysis_discards_previous_bookkeeping() {
        let mut session = TailoringSession::new(Uuid::new_v4(), None);
        session.accept_analysis(outcome_with(vec![skill_rec("r1", "Rust")]));
        session.apply_recommendation("r1").unwrap();

        session.accept_analysis(outcome_with(vec![skill_rec("r2", "Go")]));
        assert_eq!(session.status_of("r1"), RecommendationStatus::Pending);
        assert!(session.applied_ids().is_empty());
        assert_eq!(session.pending_count(), 1);
    }
}
