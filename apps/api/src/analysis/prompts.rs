// All LLM prompt constants for the analysis module. The client requests
// json_object output mode, but the prompt still spells out the schema and the
// no-prose rules because output mode alone does not pin the shape.

/// Extraction prompt. Replace `{resume_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are an expert resume analyst. Extract the following resume into structured JSON.

Return a JSON object with this EXACT schema (no extra fields, no markdown fences, no prose):
{
  "fullName": "Jane Doe",
  "professionalSummary": "One-paragraph professional summary",
  "skills": ["Rust", "SQL"],
  "experience": [
    {"company": "Acme", "role": "Engineer", "duration": "2021-2024", "description": "What they did there"}
  ],
  "education": [
    {"institution": "State University", "degree": "BSc Computer Science", "year": "2020"}
  ],
  "certifications": [
    {"name": "AWS Solutions Architect", "issuer": "Amazon", "year": "2023"}
  ],
  "projects": [
    {"name": "Project name", "description": "What it does", "technologies": ["Rust"]}
  ]
}

Rules:
- Use empty strings and empty arrays for information the resume does not contain. Never omit a key.
- Copy wording from the resume; do not embellish or invent.

RESUME:
{resume_text}"#;

/// Recommendations block, appended to the extraction prompt only when a job
/// description is supplied. Replace `{jd_text}` before sending.
pub const RECOMMENDATIONS_BLOCK_TEMPLATE: &str = r#"

Additionally, compare the resume against the job description below and add a top-level "recommendations" array to the SAME JSON object:
"recommendations": [
  {
    "id": "optional-stable-id",
    "type": "summary",
    "current": "text currently in the resume (empty string when suggesting a new addition)",
    "suggested": "improved text tailored to the job description",
    "reason": "why this change helps for this role",
    "targetIndex": 0
  }
]

Rules for recommendations:
- "type" must be exactly one of: "summary", "skill", "experience", "education", "certification", "project".
- For "experience", "education" and "project" types, set "targetIndex" to the zero-based index of the entry the change targets. Omit it only if the change is not entry-specific.
- For "skill" and "certification" additions, leave "current" as an empty string.
- Ground every "current" value in text that actually appears in the resume.

JOB DESCRIPTION:
{jd_text}"#;

/// Builds the full analysis prompt. The recommendations request is omitted
/// entirely when no JD is provided.
pub fn build_analysis_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let mut prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
    if let Some(jd) = job_description {
        prompt.push_str(&RECOMMENDATIONS_BLOCK_TEMPLATE.replace("{jd_text}", jd));
    }
    prompt
}
