use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::recommendation::{Recommendation, RecommendationStatus};
use crate::models::resume::ResumeDocument;
use crate::state::{insert_session, AppState};
use crate::tailoring::session::{persist_completion, run_analysis, Phase, TailoringSession};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub resume_text: String,
    pub job_description: Option<String>,
    pub user_id: Option<Uuid>,
    pub cv_upload_id: Option<String>,
    /// How the JD reached us ("paste", "url", ...). Defaults to "paste".
    pub jd_source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationAction {
    pub recommendation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewedRecommendation {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub status: RecommendationStatus,
}

/// Client-facing view of a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub phase: Phase,
    pub document: ResumeDocument,
    pub recommendations: Vec<ReviewedRecommendation>,
    pub pending_count: usize,
    pub fully_reviewed: bool,
    pub last_error: Option<String>,
}

impl SessionView {
    fn from_session(session: &TailoringSession) -> Self {
        Self {
            id: session.id,
            phase: session.phase,
            document: session.document.clone(),
            recommendations: session
                .recommendations
                .iter()
                .map(|r| ReviewedRecommendation {
                    recommendation: r.clone(),
                    status: session.status_of(&r.id),
                })
                .collect(),
            pending_count: session.pending_count(),
            fully_reviewed: session.is_fully_reviewed(),
            last_error: session.last_error.clone(),
        }
    }
}

/// POST /api/v1/tailoring/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }

    let user_id = req.user_id.unwrap_or_else(Uuid::new_v4);
    let mut session = TailoringSession::new(user_id, req.cv_upload_id.clone());

    let result = run_analysis(
        &mut session,
        state.analyzer.as_ref(),
        &state.store,
        &req.resume_text,
        req.job_description.as_deref(),
        req.jd_source.as_deref().unwrap_or("paste"),
    )
    .await;

    // The session is stored even when analysis fails; its last_error field
    // records what the user should see.
    let view = SessionView::from_session(&session);
    insert_session(&mut *state.sessions.write().await, session);
    result.map(|()| Json(view))
}

/// GET /api/v1/tailoring/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    Ok(Json(SessionView::from_session(session)))
}

/// POST /api/v1/tailoring/sessions/:id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecommendationAction>,
) -> Result<Json<SessionView>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    session.apply_recommendation(&req.recommendation_id)?;
    Ok(Json(SessionView::from_session(session)))
}

/// POST /api/v1/tailoring/sessions/:id/dismiss
pub async fn handle_dismiss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecommendationAction>,
) -> Result<Json<SessionView>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    session.dismiss_recommendation(&req.recommendation_id)?;
    Ok(Json(SessionView::from_session(session)))
}

/// POST /api/v1/tailoring/sessions/:id/complete
///
/// The state transition happens under the registry lock; the best-effort
/// persistence runs on a detached snapshot AFTER the lock is released, so a
/// slow storage backend never blocks other sessions.
pub async fn handle_complete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let (snapshot, view) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        let snapshot = session.finish_tailoring()?;
        (snapshot, SessionView::from_session(session))
    };
    persist_completion(&state.store, snapshot).await;
    Ok(Json(view))
}

/// DELETE /api/v1/tailoring/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tailoring/sessions/:id/reopen
pub async fn handle_reopen(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    session.reopen()?;
    Ok(Json(SessionView::from_session(session)))
}
