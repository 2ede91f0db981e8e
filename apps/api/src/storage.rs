//! Storage collaborator — client for the hosted analysis-record backend.
//!
//! The tailoring workflow treats persistence as best-effort: every call site
//! logs a failure and continues, because the in-memory session state is
//! authoritative. Call sites therefore get an explicit `Result` and decide
//! (visibly) to swallow it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Fields sent when a fresh analysis is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct SaveAnalysisRequest {
    pub user_id: Uuid,
    pub cv_upload_id: Option<String>,
    pub jd_text: String,
    pub jd_source: String,
    pub jd_metadata: Value,
    pub analysis: Value,
}

/// Partial update for an existing analysis record. `None` fields are omitted
/// from the request body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_recommendations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Value>,
}

/// The stored record as echoed back by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Seam for the hosted storage backend. Production uses `HttpAnalysisStore`;
/// tests inject recording fakes.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save_analysis(&self, request: SaveAnalysisRequest)
        -> Result<AnalysisRecord, StoreError>;

    async fn update_analysis(
        &self,
        match_id: &str,
        user_id: Uuid,
        patch: AnalysisPatch,
    ) -> Result<AnalysisRecord, StoreError>;
}

/// REST client for the hosted backend.
pub struct HttpAnalysisStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpAnalysisStore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            // Bounded timeout: persistence is best-effort, so a hung backend
            // must resolve to an error rather than stall the caller.
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn read_record(&self, response: reqwest::Response) -> Result<AnalysisRecord, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AnalysisStore for HttpAnalysisStore {
    async fn save_analysis(
        &self,
        request: SaveAnalysisRequest,
    ) -> Result<AnalysisRecord, StoreError> {
        let response = self
            .client
            .post(format!("{}/analyses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        self.read_record(response).await
    }

    async fn update_analysis(
        &self,
        match_id: &str,
        user_id: Uuid,
        patch: AnalysisPatch,
    ) -> Result<AnalysisRecord, StoreError> {
        let response = self
            .client
            .patch(format!("{}/analyses/{match_id}", self.base_url))
            .query(&[("user_id", user_id.to_string())])
            .bearer_auth(&self.api_key)
            .json(&patch)
            .send()
            .await?;
        self.read_record(response).await
    }
}
