//! Prompt construction for reply rephrasing, and validation of the result.

use crate::personality::PersonalityProfile;
use crate::style::WritingStyle;

/// Build the prompt asking a backend to rephrase a templated coach reply in
/// the user's register without changing what it asks for.
pub fn rephrase_prompt(reply: &str, style: &WritingStyle, profile: &PersonalityProfile) -> String {
    format!(
        "You are a warm, concise fitness and wellbeing coach.\n\
         Rewrite the coach reply below so it suits this user. Keep every question \
         and every requested piece of information. Do not add new questions, advice, \
         or facts. Reply in English with the rewritten text only.\n\n\
         User style: verbosity={}, tone={}, formality={}, energy={}, concern={}.\n\
         User personality: {}, prefers {} communication, support needs {}.\n\n\
         Coach reply:\n{reply}",
        style.verbosity,
        style.emotional_tone,
        style.formality,
        style.energy_level,
        style.concern_level,
        profile.personality_type,
        profile.communication_preference,
        profile.support_needs,
    )
}

/// Clean a backend's rephrasing and decide whether to use it.
///
/// Rejects empty output, output far longer than the original, and output
/// that dropped the original's question.
pub fn accept_rephrase(original: &str, candidate: &str) -> Option<String> {
    let cleaned = candidate
        .trim()
        .trim_start_matches("Coach reply:")
        .trim()
        .trim_matches('"')
        .trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() > original.chars().count() * 2 + 80 {
        return None;
    }
    if original.contains('?') && !cleaned.contains('?') {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_reply_and_style() {
        let prompt = rephrase_prompt(
            "How tall are you?",
            &WritingStyle::default(),
            &PersonalityProfile::default(),
        );
        assert!(prompt.ends_with("How tall are you?"));
        assert!(prompt.contains("verbosity=moderate"));
        assert!(prompt.contains("practical"));
    }

    #[test]
    fn accepts_reasonable_rephrasing() {
        assert_eq!(
            accept_rephrase("How tall are you?", "  \"And how tall are you?\" "),
            Some("And how tall are you?".to_string())
        );
    }

    #[test]
    fn rejects_bad_rephrasing() {
        assert_eq!(accept_rephrase("How tall are you?", "   "), None);
        assert_eq!(accept_rephrase("How tall are you?", "Great job today."), None);
        let rambling = "word ".repeat(100);
        assert_eq!(accept_rephrase("Hi?", &format!("{rambling}?")), None);
    }
}
