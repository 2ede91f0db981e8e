//! Resume document model — the structured representation of a candidate's resume.
//!
//! Two layers: `ResumeDocument` (fully populated, every field guaranteed
//! present) and the `Raw*` structs used to deserialize untrusted LLM output,
//! where every field is optional. `RawResumeDocument::normalize()` is the only
//! way to cross from one to the other, so a document is never partially
//! undefined.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub full_name: String,
    pub professional_summary: String,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub certifications: Vec<Certification>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

impl ResumeDocument {
    /// Appends a skill unless it is already present (case-sensitive exact match).
    pub fn add_skill(&mut self, skill: &str) {
        if !self.skills.iter().any(|s| s == skill) {
            self.skills.push(skill.to_string());
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw (untrusted) layer
// ────────────────────────────────────────────────────────────────────────────

/// Resume shape as returned by the LLM. All fields optional; unknown fields
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResumeDocument {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub professional_summary: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<Vec<RawExperienceEntry>>,
    #[serde(default)]
    pub education: Option<Vec<RawEducationEntry>>,
    #[serde(default)]
    pub certifications: Option<Vec<RawCertification>>,
    #[serde(default)]
    pub projects: Option<Vec<RawProject>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExperienceEntry {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEducationEntry {
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCertification {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
}

impl RawResumeDocument {
    /// Produces a fully-populated document, defaulting every missing field to
    /// its empty form.
    pub fn normalize(self) -> ResumeDocument {
        ResumeDocument {
            full_name: self.full_name.unwrap_or_default(),
            professional_summary: self.professional_summary.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            experience: self
                .experience
                .unwrap_or_default()
                .into_iter()
                .map(|e| ExperienceEntry {
                    company: e.company.unwrap_or_default(),
                    role: e.role.unwrap_or_default(),
                    duration: e.duration.unwrap_or_default(),
                    description: e.description.unwrap_or_default(),
                })
                .collect(),
            education: self
                .education
                .unwrap_or_default()
                .into_iter()
                .map(|e| EducationEntry {
                    institution: e.institution.unwrap_or_default(),
                    degree: e.degree.unwrap_or_default(),
                    year: e.year.unwrap_or_default(),
                })
                .collect(),
            certifications: self
                .certifications
                .unwrap_or_default()
                .into_iter()
                .map(|c| Certification {
                    name: c.name.unwrap_or_default(),
                    issuer: c.issuer.unwrap_or_default(),
                    year: c.year.unwrap_or_default(),
                })
                .collect(),
            projects: self
                .projects
                .unwrap_or_default()
                .into_iter()
                .map(|p| Project {
                    name: p.name.unwrap_or_default(),
                    description: p.description.unwrap_or_default(),
                    technologies: p.technologies.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fills_every_missing_field() {
        let raw: RawResumeDocument = serde_json::from_str("{}").unwrap();
        let doc = raw.normalize();
        assert_eq!(doc.full_name, "");
        assert_eq!(doc.professional_summary, "");
        assert!(doc.skills.is_empty());
        assert!(doc.experience.is_empty());
        assert!(doc.education.is_empty());
        assert!(doc.certifications.is_empty());
        assert!(doc.projects.is_empty());
    }

    #[test]
    fn test_normalize_tolerates_explicit_nulls() {
        let json = r#"{
            "fullName": null,
            "skills": null,
            "experience": [{"company": "Acme", "description": null}]
        }"#;
        let raw: RawResumeDocument = serde_json::from_str(json).unwrap();
        let doc = raw.normalize();
        assert_eq!(doc.full_name, "");
        assert_eq!(doc.experience.len(), 1);
        assert_eq!(doc.experience[0].company, "Acme");
        assert_eq!(doc.experience[0].description, "");
    }

    #[test]
    fn test_normalize_ignores_unknown_fields() {
        let json = r#"{"fullName": "Jane Doe", "linkedinUrl": "https://example.com"}"#;
        let raw: RawResumeDocument = serde_json::from_str(json).unwrap();
        assert_eq!(raw.normalize().full_name, "Jane Doe");
    }

    #[test]
    fn test_add_skill_skips_exact_duplicate() {
        let mut doc = ResumeDocument {
            skills: vec!["SQL".to_string()],
            ..Default::default()
        };
        doc.add_skill("SQL");
        assert_eq!(doc.skills, vec!["SQL"]);
    }

    #[test]
    fn test_add_skill_is_case_sensitive() {
        let mut doc = ResumeDocument {
            skills: vec!["SQL".to_string()],
            ..Default::default()
        };
        doc.add_skill("sql");
        assert_eq!(doc.skills, vec!["SQL", "sql"]);
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let doc = ResumeDocument {
            full_name: "Jane Doe".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("fullName").is_some());
        assert!(json.get("professionalSummary").is_some());
    }
}
