//! Prompts for outline generation.
//!
//! Centralising every prompt here keeps the JSON contract in one place: the
//! shape described in [`DEFAULT_SYSTEM_PROMPT`] is exactly what
//! [`crate::outline::parse_outline`] accepts. Change one, change the other.
//!
//! Callers can override the system prompt via
//! [`crate::config::GenerationConfig::system_prompt`].

/// Default system prompt describing the outline JSON contract.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert presentation designer and content strategist. Analyse the provided content and plan a complete, well-structured slide deck.

Return ONE JSON object with this structure:
{
  "title": "Presentation Title",
  "subtitle": "Optional subtitle",
  "slides": [
    {
      "title": "Slide Title",
      "type": "content",
      "content": ["Point 1", "  - Sub-point", "Point 2"],
      "notes": "Speaker notes with context, examples and talking points"
    }
  ]
}

Slide types and their extra fields:
- "content"    (default) bullet points in "content"; prefix sub-points with "  - "
- "section"    divider between major topics; only "title" is needed
- "comparison" two columns: "left_title", "left": [...], "right_title", "right": [...]
- "code"       a listing: "code": "...", "language": "python"
- "table"      tabular facts: "headers": [...], "rows": [[...], ...]
- "chart"      numeric data: "categories": [...], "series": [{"name": "...", "values": [1, 2]}],
               optional "chart_type": "bar" | "line" | "pie"

Guidelines:
- Decide the number of slides from the depth of the content
- Keep every important fact, number, definition and example from the source
- Bullets are informative sentences, not bare keywords
- Use section slides for major topic transitions
- Use comparison, table and chart slides whenever the source compares things or carries data
- Speaker notes expand on the bullets for the presenter

IMPORTANT: Return ONLY valid JSON. No markdown code fences, no commentary."#;

/// Marker appended to content cut at the character cap.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length...]";

/// Build the user prompt for one source document.
pub fn outline_user_prompt(content: &str, file_name: &str) -> String {
    format!(
        "Please analyse the following content from file \"{file_name}\" and create a comprehensive \
presentation outline.\n\n---\n{content}\n---\n\nReturn the outline JSON now."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_documents_every_type() {
        for t in ["content", "section", "comparison", "code", "table", "chart"] {
            assert!(
                DEFAULT_SYSTEM_PROMPT.contains(&format!("\"{t}\"")),
                "missing type {t}"
            );
        }
    }

    #[test]
    fn user_prompt_names_file_and_embeds_content() {
        let p = outline_user_prompt("Quarterly revenue grew 12%.", "q3.md");
        assert!(p.contains("\"q3.md\""));
        assert!(p.contains("Quarterly revenue grew 12%."));
    }
}
