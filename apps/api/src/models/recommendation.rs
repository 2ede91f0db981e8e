//! Recommendation model — a single proposed edit to a resume field.
//!
//! Recommendations are immutable once created by an analysis pass; the
//! session tracks their review status separately (pending → applied or
//! dismissed, one-way).

use serde::{Deserialize, Serialize};

/// Which part of the document a recommendation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Summary,
    Skill,
    Experience,
    Education,
    Certification,
    Project,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Unique within a session. Generated (`rec-<millis>-<index>`) when the
    /// model omits one.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    /// Existing text to replace. Empty string signals a new addition.
    pub current: String,
    pub suggested: String,
    pub reason: String,
    /// Which experience/education/project entry the substitution targets.
    /// `None` falls back to scanning every entry in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_index: Option<usize>,
}

/// Review status of a recommendation within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Pending,
    Applied,
    Dismissed,
}

/// Recommendation shape as returned by the LLM. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecommendation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub suggested: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub target_index: Option<usize>,
}

impl RecommendationKind {
    /// Parses the LLM's lowercase type tag. Unknown tags yield `None` and the
    /// recommendation is dropped during normalization.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "summary" => Some(Self::Summary),
            "skill" => Some(Self::Skill),
            "experience" => Some(Self::Experience),
            "education" => Some(Self::Education),
            "certification" => Some(Self::Certification),
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}
