//! AI Analysis — turns raw resume text (plus an optional job description)
//! into a typed `ResumeDocument` and a list of tailoring recommendations.
//!
//! Flow: build prompt → single LLM call (no retry) → lenient JSON recovery →
//! normalize into typed models. A failed call surfaces immediately; the
//! session controller decides what the user sees.

pub mod normalize;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::analysis::normalize::normalize_analysis;
use crate::analysis::prompts::build_analysis_prompt;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::recommendation::Recommendation;
use crate::models::resume::ResumeDocument;

/// Result of one analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub resume: ResumeDocument,
    pub recommendations: Vec<Recommendation>,
    /// The JD text the recommendations were generated against. Empty when no
    /// JD was supplied.
    pub jd_text: String,
}

/// Pluggable analysis seam. Production uses `LlmResumeAnalyzer`; tests inject
/// canned outcomes.
#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AnalysisOutcome, LlmError>;
}

/// Production analyzer backed by the shared LLM client.
pub struct LlmResumeAnalyzer {
    llm: LlmClient,
}

impl LlmResumeAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeAnalyzer for LlmResumeAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AnalysisOutcome, LlmError> {
        let prompt = build_analysis_prompt(resume_text, job_description);
        let payload = self.llm.call_json(&prompt).await?;
        let (resume, recommendations) = normalize_analysis(payload);

        info!(
            "Analysis complete: {} skills, {} experience entries, {} recommendations",
            resume.skills.len(),
            resume.experience.len(),
            recommendations.len()
        );

        Ok(AnalysisOutcome {
            resume,
            recommendations,
            jd_text: job_description.unwrap_or_default().to_string(),
        })
    }
}
