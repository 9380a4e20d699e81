//! Reply composition around the rendered question.

use crate::personality::PersonalityType;
use crate::style::{Formality, WritingStyle};

use super::generator::{field_label, join_labels};
use super::tone::polish;

/// User-facing reply for an unexpected failure. Never carries error detail.
pub const APOLOGY: &str =
    "Sorry, something went wrong on my side. Could you say that again?";

fn acknowledgement(personality: PersonalityType, style: &WritingStyle) -> &'static str {
    match (personality, style.formality) {
        (_, Formality::Formal) => "Thank you, noted.",
        (PersonalityType::Analytical, _) => "Noted.",
        (PersonalityType::Emotional, _) => "Thank you for sharing that.",
        (PersonalityType::Social, _) => "Great, thanks!",
        (PersonalityType::Practical, _) => "Got it.",
    }
}

/// Composes whole replies. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    /// First message of a session.
    pub fn opening(&self, checklist_name: &str, question: &str) -> String {
        polish(&format!(
            "Hi! I'm your coach. Let's start your {} together. {question}",
            checklist_name.to_lowercase()
        ))
    }

    /// A check was completed and the conversation moves on to `question`.
    /// Greets by name when the name was just learned.
    pub fn advancement(
        &self,
        personality: PersonalityType,
        style: &WritingStyle,
        new_name: Option<&str>,
        question: &str,
    ) -> String {
        let lead = match new_name {
            Some(name) if style.formality == Formality::Formal => {
                format!("Pleased to meet you, {name}.")
            }
            Some(name) => format!("Nice to meet you, {name}!"),
            None => acknowledgement(personality, style).to_string(),
        };
        polish(&format!("{lead} {question}"))
    }

    /// The focused check is still incomplete: say what is missing, then ask.
    pub fn completion_request(
        &self,
        missing_fields: &[String],
        made_progress: bool,
        attempt: u32,
        question: &str,
    ) -> String {
        let labels: Vec<String> = missing_fields.iter().map(|f| field_label(f)).collect();
        let lead = if made_progress {
            "Thanks, that helps."
        } else if attempt > 0 {
            "I didn't quite catch that."
        } else {
            ""
        };
        let missing = if labels.is_empty() {
            String::new()
        } else {
            format!("I still need your {}.", join_labels(&labels))
        };
        polish(&format!("{lead} {missing} {question}"))
    }

    /// The checklist has nothing left to ask.
    pub fn completion(&self, checklist_name: &str, name: Option<&str>) -> String {
        let who = name.map(|n| format!(", {n}")).unwrap_or_default();
        polish(&format!(
            "That's everything I needed for your {}{who}. Thank you! I'll use this to tailor your plan.",
            checklist_name.to_lowercase()
        ))
    }

    /// Nothing can be asked, but the checklist isn't done: a failed check
    /// holds the rest back until an operator steps in.
    pub fn blocked(&self, checklist_name: &str, name: Option<&str>) -> String {
        let who = name.map(|n| format!(", {n}")).unwrap_or_default();
        polish(&format!(
            "Thanks{who}. We can't finish your {} just yet, because an earlier step is still open. Your coach will pick it up with you.",
            checklist_name.to_lowercase()
        ))
    }
}
