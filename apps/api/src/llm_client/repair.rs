//! Tolerant recovery of JSON from raw model output.
//!
//! Models wrap JSON in markdown fences, surround it with prose, leave
//! trailing commas, and occasionally emit raw control bytes inside strings.
//! Each helper here handles exactly one of those failure modes; the parse
//! ladder in the client module chains them.

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Extracts the first top-level `{...}` span when prose surrounds the JSON.
/// Assumes exactly one object is present; returns the input unchanged when no
/// braces are found.
pub fn extract_object_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Removes commas immediately preceding a closing brace or bracket, ignoring
/// anything inside string literals.
pub fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '}' | ']' => {
                // Drop a comma that (modulo whitespace) directly precedes us.
                let trimmed_len = out.trim_end().len();
                if out[..trimmed_len].ends_with(',') {
                    out.remove(trimmed_len - 1);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Strips ASCII control characters (0x00–0x1F and 0x7F). This also removes
/// structural whitespace like newlines, which JSON tolerates losing.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_control())
        .collect()
}
