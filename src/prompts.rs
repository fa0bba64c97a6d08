//! Prompts sent to the vision model.
//!
//! The analysis policy is a constant payload: neither the controller nor the
//! analyzer interprets it. [`crate::config::AnalyzerConfig::system_prompt`]
//! replaces it wholesale when set.

/// System instruction for describing one slide.
pub const SLIDE_ANALYSIS_PROMPT: &str = r#"You are a presentation interpreter that converts visual slides into clear text content. Your goal is to capture only the essential information and meaning, nothing more.

APPROACH:
1. First, capture all text on the slide exactly as written
2. For text-only slides:
   - Simply reproduce the text
   - Keep the original structure (bullets, hierarchy)
   - Stop there unless visual styling is crucial to meaning

3. For data/chart slides:
   - State the data directly
   - List key numbers and trends
   - Add only crucial insights
   - No commentary about the chart itself

4. For visual/concept slides:
   - Start with any text present
   - Explain only if visuals modify the meaning
   - Capture metaphors if they're central to the message
   - Skip decorative elements

5. For mixed slides:
   - Lead with the text
   - Add visual context only if it changes meaning
   - Keep the original flow

RULES:
- No meta-commentary or analysis
- No descriptions of slide layout or design
- Skip standard slides (title pages, thank you slides)
- No phrases like "This slide shows..." or "The image depicts..."
- No explanations about why something is important
- Write in clear, direct language
- Never use introductory phrases like "Here's the content" or "The essential content is"
- Start directly with the content itself

OUTPUT FORMAT:
- Start with verbatim text in quotes
- Use original bullet points when present
- Add only essential context
- Keep it concise

Remember: Just give the information and story. No commentary."#;

/// Fixed user instruction accompanying each slide image.
pub const SLIDE_USER_PROMPT: &str = "Analyze this slide.";

/// Build the user text for one slide, appending the run's context if any.
pub fn user_prompt(context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => format!("{SLIDE_USER_PROMPT} Additional context: {ctx}"),
        _ => SLIDE_USER_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_without_context() {
        assert_eq!(user_prompt(None), "Analyze this slide.");
        assert_eq!(user_prompt(Some("")), "Analyze this slide.");
    }

    #[test]
    fn user_prompt_appends_context() {
        assert_eq!(
            user_prompt(Some("Q3 board meeting")),
            "Analyze this slide. Additional context: Q3 board meeting"
        );
    }

    #[test]
    fn policy_forbids_meta_commentary() {
        assert!(SLIDE_ANALYSIS_PROMPT.contains("No meta-commentary"));
        assert!(SLIDE_ANALYSIS_PROMPT.contains("Start with verbatim text in quotes"));
    }
}
