//! Tone adjustment: an ordered pipeline of pure text transforms.
//!
//! Stage order is personality → verbosity → formality → energy →
//! conversation state → support, then polish. Each stage sees the text as
//! left by the previous one.

use crate::flow::{ConversationState, Engagement, InteractionStyle, Tone};
use crate::personality::{PersonalityProfile, PersonalityType, SupportLevel};
use crate::style::{EmotionalTone, EnergyLevel, Formality, Verbosity, WritingStyle};

/// Everything a stage may read.
#[derive(Debug, Clone, Copy)]
pub struct ToneContext<'a> {
    pub profile: &'a PersonalityProfile,
    pub style: &'a WritingStyle,
    pub state: &'a ConversationState,
    pub interaction: &'a InteractionStyle,
    /// The question touches a sensitive topic.
    pub sensitive: bool,
}

pub type Stage = fn(String, &ToneContext<'_>) -> String;

/// The pipeline, in application order.
pub static STAGES: &[(&str, Stage)] = &[
    ("personality", personality_stage),
    ("verbosity", verbosity_stage),
    ("formality", formality_stage),
    ("energy", energy_stage),
    ("conversation_state", conversation_state_stage),
    ("support", support_stage),
    ("polish", polish_stage),
];

const FORMAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("What's", "What is"),
    ("what's", "what is"),
    ("How's", "How is"),
    ("how's", "how is"),
    ("you're", "you are"),
    ("don't", "do not"),
    ("I'd", "I would"),
    ("Let's", "Let us"),
    ("Thanks", "Thank you"),
    ("Got it", "Understood"),
    ("Love the energy!", "Wonderful."),
    ("roughly", "approximately"),
];

const CASUAL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("What is", "What's"),
    ("How is", "How's"),
    ("Would you mind telling me", "Mind telling me"),
    ("Could you share", "Can you share"),
    ("Could you tell me", "Can you tell me"),
    ("Thank you", "Thanks"),
    ("Understood", "Got it"),
    ("do not", "don't"),
];

/// Softening phrases dropped once the relationship allows directness.
const SOFTENERS: &[&str] = &[
    "If you're comfortable sharing, ",
    "If you are comfortable sharing, ",
    ", if you don't mind me asking",
    ", if you do not mind me asking",
    "Would you mind telling me ",
];

const EMPATHY_OPENER: &str = "I hear you.";
const ENERGY_OPENER: &str = "Love the energy!";
const NO_RUSH: &str = "No rush.";
const DETAIL_INVITE: &str = "Any detail helps.";
const SUPPORT_NOTE: &str = "Take your time, there's no wrong answer.";
const SENSITIVE_NOTE: &str = "Share only as much as you're comfortable with.";

fn prepend(text: String, opener: &str) -> String {
    if text.starts_with(opener) {
        text
    } else {
        format!("{opener} {text}")
    }
}

fn append(text: String, note: &str) -> String {
    if text.contains(note) {
        text
    } else {
        format!("{text} {note}")
    }
}

/// Split into sentences, keeping terminal punctuation.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '?' | '!') {
            let next = text[i + c.len_utf8()..].chars().next();
            if next.is_none_or(char::is_whitespace) {
                let sentence = text[start..i + c.len_utf8()].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = i + c.len_utf8();
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

/// Openers by personality, when the user's tone calls for one.
pub fn personality_stage(text: String, ctx: &ToneContext<'_>) -> String {
    match ctx.profile.personality_type {
        PersonalityType::Emotional
            if matches!(
                ctx.style.emotional_tone,
                EmotionalTone::Negative | EmotionalTone::Anxious
            ) =>
        {
            prepend(text, EMPATHY_OPENER)
        }
        PersonalityType::Social if ctx.style.energy_level == EnergyLevel::High => {
            prepend(text, ENERGY_OPENER)
        }
        _ => text,
    }
}

/// Brief writers get only the question; detailed writers get an invitation
/// to elaborate.
pub fn verbosity_stage(text: String, ctx: &ToneContext<'_>) -> String {
    match ctx.style.verbosity {
        Verbosity::Brief => {
            let parts = sentences(&text);
            let questions: Vec<&str> = parts.iter().copied().filter(|s| s.ends_with('?')).collect();
            if questions.is_empty() || questions.len() == parts.len() {
                text
            } else {
                questions.join(" ")
            }
        }
        Verbosity::Detailed if text.contains('?') => append(text, DETAIL_INVITE),
        _ => text,
    }
}

pub fn formality_stage(text: String, ctx: &ToneContext<'_>) -> String {
    let table = match ctx.style.formality {
        Formality::Formal => FORMAL_SUBSTITUTIONS,
        Formality::Casual => CASUAL_SUBSTITUTIONS,
        Formality::Neutral => return text,
    };
    table
        .iter()
        .fold(text, |acc, (from, to)| acc.replace(*from, to))
}

/// High energy turns a plain opener into an exclamation; low energy removes
/// exclamation marks.
pub fn energy_stage(text: String, ctx: &ToneContext<'_>) -> String {
    match ctx.style.energy_level {
        EnergyLevel::Low => text.replace('!', "."),
        EnergyLevel::High => {
            let parts = sentences(&text);
            match parts.split_first() {
                Some((first, rest)) if first.ends_with('.') && !rest.is_empty() => {
                    let mut out = format!("{}!", first.trim_end_matches('.'));
                    for sentence in rest {
                        out.push(' ');
                        out.push_str(sentence);
                    }
                    out
                }
                _ => text,
            }
        }
        EnergyLevel::Medium => text,
    }
}

/// Low engagement slows down; a direct relationship drops softeners.
pub fn conversation_state_stage(text: String, ctx: &ToneContext<'_>) -> String {
    let mut text = text;
    if ctx.interaction.tone == Tone::Direct {
        for softener in SOFTENERS {
            text = text.replace(*softener, "");
        }
    }
    if ctx.state.user_engagement == Engagement::Low {
        text = prepend(text, NO_RUSH);
    }
    text
}

/// Supportive notes for users who need them, and for sensitive topics before
/// trust is built.
pub fn support_stage(text: String, ctx: &ToneContext<'_>) -> String {
    let mut text = text;
    if ctx.profile.support_needs == SupportLevel::High || ctx.interaction.tone == Tone::Supportive
    {
        text = append(text, SUPPORT_NOTE);
    }
    if ctx.sensitive && ctx.state.relationship_strength < 0.5 {
        text = append(text, SENSITIVE_NOTE);
    }
    text
}

pub fn polish_stage(text: String, _ctx: &ToneContext<'_>) -> String {
    polish(&text)
}

/// Uppercase the first letter of every sentence. A sentence starts the text
/// or follows `.`, `!` or `?` and a space.
fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    let mut prev = None;
    for c in text.chars() {
        if prev.is_some_and(|p| matches!(p, '.' | '!' | '?')) && c == ' ' {
            at_start = true;
        }
        if at_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            at_start = false;
        } else {
            if at_start && c != ' ' {
                at_start = false;
            }
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Normalize whitespace and punctuation, capitalize, and guarantee terminal
/// punctuation.
pub fn polish(text: &str) -> String {
    let mut out = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for (from, to) in [
        (" ?", "?"),
        (" !", "!"),
        (" .", "."),
        (" ,", ","),
        ("..", "."),
        ("!!", "!"),
        ("?.", "?"),
        ("!.", "!"),
        (",.", "."),
    ] {
        while out.contains(from) {
            out = out.replace(from, to);
        }
    }
    let mut out = capitalize_sentences(out.trim_start_matches([',', ' ']));
    if out.is_empty() {
        return out;
    }
    if !out.ends_with(['.', '?', '!']) {
        out.push('.');
    }
    out
}

/// Runs [`STAGES`] in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneAdjuster;

impl ToneAdjuster {
    pub fn new() -> Self {
        Self
    }

    pub fn adjust(&self, text: &str, ctx: &ToneContext<'_>) -> String {
        STAGES
            .iter()
            .fold(text.to_string(), |acc, (_, stage)| stage(acc, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Pace, Priority, QuestionStyle};

    struct Fixture {
        profile: PersonalityProfile,
        style: WritingStyle,
        state: ConversationState,
        interaction: InteractionStyle,
        sensitive: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                profile: PersonalityProfile::default(),
                style: WritingStyle::default(),
                state: ConversationState {
                    relationship_strength: 0.6,
                    ..ConversationState::default()
                },
                interaction: InteractionStyle {
                    tone: Tone::Warm,
                    question_style: QuestionStyle::Open,
                    pace: Pace::Moderate,
                    priority: Priority::Rapport,
                },
                sensitive: false,
            }
        }

        fn ctx(&self) -> ToneContext<'_> {
            ToneContext {
                profile: &self.profile,
                style: &self.style,
                state: &self.state,
                interaction: &self.interaction,
                sensitive: self.sensitive,
            }
        }
    }

    #[test]
    fn neutral_context_only_polishes() {
        let f = Fixture::new();
        assert_eq!(
            ToneAdjuster::new().adjust("  how tall are you ?", &f.ctx()),
            "How tall are you?"
        );
    }

    #[test]
    fn polish_guarantees_terminal_punctuation() {
        assert_eq!(polish("tell me more"), "Tell me more.");
        assert_eq!(polish(""), "");
        assert_eq!(polish(", and you?"), "And you?");
    }

    #[test]
    fn polish_capitalizes_every_sentence() {
        assert_eq!(polish("great!!  what next ?"), "Great! What next?");
        assert_eq!(polish("noted. how tall are you? tell me"), "Noted. How tall are you? Tell me.");
        assert_eq!(polish("I'm 1.75 m tall"), "I'm 1.75 m tall.");
        assert_eq!(polish("thanks. 3 days, right?"), "Thanks. 3 days, right?");
    }

    #[test]
    fn empathy_opener_for_distressed_emotional_users() {
        let mut f = Fixture::new();
        f.profile.personality_type = PersonalityType::Emotional;
        f.style.emotional_tone = EmotionalTone::Anxious;
        let out = personality_stage("How are you sleeping?".into(), &f.ctx());
        assert_eq!(out, "I hear you. How are you sleeping?");
    }

    #[test]
    fn brief_keeps_only_questions() {
        let mut f = Fixture::new();
        f.style.verbosity = Verbosity::Brief;
        let out = verbosity_stage("I hear you. How tall are you?".into(), &f.ctx());
        assert_eq!(out, "How tall are you?");
        let statement = verbosity_stage("Noted.".into(), &f.ctx());
        assert_eq!(statement, "Noted.");
    }

    #[test]
    fn formality_tables() {
        let mut f = Fixture::new();
        f.style.formality = Formality::Formal;
        assert_eq!(
            formality_stage("What's your goal? Thanks".into(), &f.ctx()),
            "What is your goal? Thank you"
        );
        f.style.formality = Formality::Casual;
        assert_eq!(
            formality_stage("What is your goal?".into(), &f.ctx()),
            "What's your goal?"
        );
    }

    #[test]
    fn energy_adjusts_punctuation() {
        let mut f = Fixture::new();
        f.style.energy_level = EnergyLevel::High;
        assert_eq!(
            energy_stage("Nice to meet you. How old are you?".into(), &f.ctx()),
            "Nice to meet you! How old are you?"
        );
        f.style.energy_level = EnergyLevel::Low;
        assert_eq!(energy_stage("Great!".into(), &f.ctx()), "Great.");
    }

    #[test]
    fn direct_tone_drops_softeners() {
        let mut f = Fixture::new();
        f.interaction.tone = Tone::Direct;
        let out = ToneAdjuster::new().adjust(
            "If you're comfortable sharing, what do you weigh at the moment?",
            &f.ctx(),
        );
        assert_eq!(out, "What do you weigh at the moment?");
    }

    #[test]
    fn low_engagement_and_support_notes() {
        let mut f = Fixture::new();
        f.state.user_engagement = Engagement::Low;
        f.profile.support_needs = SupportLevel::High;
        let out = ToneAdjuster::new().adjust("How are you feeling?", &f.ctx());
        assert_eq!(out, format!("{NO_RUSH} How are you feeling? {SUPPORT_NOTE}"));
    }

    #[test]
    fn sensitive_note_before_trust() {
        let mut f = Fixture::new();
        f.sensitive = true;
        f.state.relationship_strength = 0.2;
        let out = ToneAdjuster::new().adjust("Any injuries?", &f.ctx());
        assert!(out.ends_with(SENSITIVE_NOTE));
        f.state.relationship_strength = 0.8;
        assert_eq!(ToneAdjuster::new().adjust("Any injuries?", &f.ctx()), "Any injuries?");
    }

    #[test]
    fn stage_order_is_fixed() {
        let names: Vec<&str> = STAGES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            [
                "personality",
                "verbosity",
                "formality",
                "energy",
                "conversation_state",
                "support",
                "polish"
            ]
        );
    }
}
