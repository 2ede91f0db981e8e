//! Normalization of the parsed analysis payload into typed models.
//!
//! The LLM's JSON is already structurally valid by the time it reaches this
//! module; here the untrusted shape is converted into a `ResumeDocument` that
//! is never partially undefined, and raw recommendations are validated,
//! defaulted, and given generated ids where the model omitted them.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::recommendation::{RawRecommendation, Recommendation, RecommendationKind};
use crate::models::resume::{RawResumeDocument, ResumeDocument};

/// Top-level analysis payload: resume fields plus an optional
/// `recommendations` array alongside them.
#[derive(Debug, Default, Deserialize)]
struct RawAnalysis {
    #[serde(flatten)]
    resume: RawResumeDocument,
    #[serde(default)]
    recommendations: Option<Vec<RawRecommendation>>,
}

/// Converts the parsed payload into a document and recommendation list.
pub fn normalize_analysis(payload: Value) -> (ResumeDocument, Vec<Recommendation>) {
    let raw: RawAnalysis = match serde_json::from_value(payload) {
        Ok(raw) => raw,
        Err(e) => {
            // Shape surprises degrade to an empty document rather than a hard
            // failure; the session surfaces "nothing extracted" to the user.
            warn!("Analysis payload had unexpected shape: {e}");
            RawAnalysis::default()
        }
    };

    let document = raw.resume.normalize();
    let recommendations = normalize_recommendations(raw.recommendations.unwrap_or_default());
    (document, recommendations)
}

/// Validates raw recommendations, preserving order. Entries missing an id get
/// `rec-<unix-millis>-<index>`. Ids are unique within the batch: a
/// model-supplied id that repeats an earlier one is regenerated, since the
/// session keys its review bookkeeping on the id.
pub fn normalize_recommendations(raw: Vec<RawRecommendation>) -> Vec<Recommendation> {
    let batch_millis = Utc::now().timestamp_millis();
    let mut seen = std::collections::HashSet::new();

    raw.into_iter()
        .enumerate()
        .filter_map(|(index, r)| {
            let tag = r.kind.unwrap_or_default();
            let Some(kind) = RecommendationKind::parse(&tag) else {
                warn!("Dropping recommendation {index} with unknown type {tag:?}");
                return None;
            };
            let mut id = match r.id {
                Some(id) if !id.trim().is_empty() => id,
                _ => format!("rec-{batch_millis}-{index}"),
            };
            let mut bump = 0;
            while !seen.insert(id.clone()) {
                warn!("Recommendation id {id:?} repeats within the batch; regenerating");
                id = format!("rec-{batch_millis}-{index}-{bump}");
                bump += 1;
            }
            Some(Recommendation {
                id,
                kind,
                current: r.current.unwrap_or_default(),
                suggested: r.suggested.unwrap_or_default(),
                reason: r.reason.unwrap_or_default(),
                target_index: r.target_index,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_analysis_full_payload() {
        let payload = json!({
            "fullName": "Jane Doe",
            "professionalSummary": "Engineer",
            "skills": ["Rust"],
            "experience": [
                {"company": "Acme", "role": "Dev", "duration": "2021-2024", "description": "Built reports"}
            ],
            "education": [],
            "certifications": [],
            "projects": [],
            "recommendations": [
                {"type": "skill", "current": "", "suggested": "SQL", "reason": "JD asks for SQL"}
            ]
        });
        let (doc, recs) = normalize_analysis(payload);
        assert_eq!(doc.full_name, "Jane Doe");
        assert_eq!(doc.experience[0].description, "Built reports");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Skill);
        assert_eq!(recs[0].suggested, "SQL");
    }

    #[test]
    fn test_normalize_analysis_missing_recommendations_defaults_empty() {
        let (doc, recs) = normalize_analysis(json!({"fullName": "Jane Doe"}));
        assert_eq!(doc.full_name, "Jane Doe");
        assert!(recs.is_empty());
    }

    #[test]
    fn test_missing_ids_generated_and_unique() {
        let raw = vec![
            RawRecommendation {
                kind: Some("skill".to_string()),
                suggested: Some("Rust".to_string()),
                ..Default::default()
            },
            RawRecommendation {
                kind: Some("summary".to_string()),
                suggested: Some("New summary".to_string()),
                ..Default::default()
            },
        ];
        let recs = normalize_recommendations(raw);
        assert_eq!(recs.len(), 2);
        let ids: HashSet<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 2, "generated ids must be unique within a batch");
        for rec in &recs {
            assert!(rec.id.starts_with("rec-"));
            assert!(!rec.id.trim().is_empty());
        }
    }

    #[test]
    fn test_provided_ids_kept() {
        let raw = vec![RawRecommendation {
            id: Some("stable-1".to_string()),
            kind: Some("summary".to_string()),
            ..Default::default()
        }];
        assert_eq!(normalize_recommendations(raw)[0].id, "stable-1");
    }

    #[test]
    fn test_blank_id_treated_as_missing() {
        let raw = vec![RawRecommendation {
            id: Some("   ".to_string()),
            kind: Some("summary".to_string()),
            ..Default::default()
        }];
        assert!(normalize_recommendations(raw)[0].id.starts_with("rec-"));
    }

    #[test]
    fn test_repeated_model_supplied_ids_are_regenerated() {
        let raw = vec![
            RawRecommendation {
                id: Some("dup-1".to_string()),
                kind: Some("skill".to_string()),
                suggested: Some("Rust".to_string()),
                ..Default::default()
            },
            RawRecommendation {
                id: Some("dup-1".to_string()),
                kind: Some("skill".to_string()),
                suggested: Some("Go".to_string()),
                ..Default::default()
            },
        ];
        let recs = normalize_recommendations(raw);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id, "dup-1");
        assert_ne!(recs[1].id, "dup-1");
        assert!(!recs[1].id.trim().is_empty());
        let ids: HashSet<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_unknown_type_dropped_order_preserved() {
        let raw = vec![
            RawRecommendation {
                kind: Some("skill".to_string()),
                suggested: Some("A".to_string()),
                ..Default::default()
            },
            RawRecommendation {
                kind: Some("hobby".to_string()),
                ..Default::default()
            },
            RawRecommendation {
                kind: Some("project".to_string()),
                suggested: Some("B".to_string()),
                ..Default::default()
            },
        ];
        let recs = normalize_recommendations(raw);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].suggested, "A");
        assert_eq!(recs[1].suggested, "B");
    }

    #[test]
    fn test_non_object_payload_degrades_to_empty() {
        let (doc, recs) = normalize_analysis(json!([1, 2, 3]));
        assert_eq!(doc, ResumeDocument::default());
        assert!(recs.is_empty());
    }
}
