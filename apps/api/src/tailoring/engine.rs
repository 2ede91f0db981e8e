//! Recommendation application engine.
//!
//! `apply` is a pure function: it clones the input document and returns a new
//! one, so the caller's original is never touched. Substitution kinds
//! (experience, education, project) honor `target_index` when the analysis
//! provided one; without it they fall back to scanning every entry, which is
//! the legacy behavior and can touch entries sharing a matching substring.

use crate::models::recommendation::{Recommendation, RecommendationKind};
use crate::models::resume::{Certification, ResumeDocument};

/// Issuer placeholder for certifications the user has not earned yet.
const PENDING_ISSUER: &str = "Pending";
const PENDING_YEAR: &str = "2024";

/// Applies one recommendation to a document, producing a new document.
pub fn apply(document: &ResumeDocument, recommendation: &Recommendation) -> ResumeDocument {
    let mut doc = document.clone();

    match recommendation.kind {
        RecommendationKind::Summary => {
            doc.professional_summary = recommendation.suggested.clone();
        }
        RecommendationKind::Skill => {
            doc.add_skill(&recommendation.suggested);
        }
        RecommendationKind::Experience => {
            substitute(
                doc.experience
                    .iter_mut()
                    .map(|e| vec![&mut e.description])
                    .collect(),
                recommendation,
            );
        }
        RecommendationKind::Education => {
            substitute(
                doc.education
                    .iter_mut()
                    .map(|e| vec![&mut e.degree, &mut e.institution])
                    .collect(),
                recommendation,
            );
        }
        RecommendationKind::Certification => {
            doc.certifications.push(Certification {
                name: recommendation.suggested.clone(),
                issuer: PENDING_ISSUER.to_string(),
                year: PENDING_YEAR.to_string(),
            });
        }
        RecommendationKind::Project => {
            substitute(
                doc.projects
                    .iter_mut()
                    .map(|p| vec![&mut p.description])
                    .collect(),
                recommendation,
            );
        }
    }

    doc
}

/// Replaces the first literal occurrence of `current` with `suggested` in each
/// field of each targeted entry. An empty `current` is a no-op: the "new
/// addition" sentinel must not degenerate into a position-zero insert.
fn substitute(entries: Vec<Vec<&mut String>>, recommendation: &Recommendation) {
    if recommendation.current.is_empty() {
        return;
    }
    for (index, fields) in entries.into_iter().enumerate() {
        if let Some(target) = recommendation.target_index {
            if target != index {
                continue;
            }
        }
        for field in fields {
            if field.contains(&recommendation.current) {
                *field = field.replacen(&recommendation.current, &recommendation.suggested, 1);
            }
        }
    }
}
