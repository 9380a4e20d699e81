//! Question selection: what to ask next, in strict tier order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checklist::{Check, ChecklistInstance, ExtractedData};
use crate::flow::{ConversationPhase, ConversationState};
use crate::personality::{PersonalityProfile, PersonalityType};
use crate::style::{Verbosity, WritingStyle};

/// How many pending checks tier 3 considers.
const UPCOMING_LIMIT: usize = 3;
const TYPE_AFFINITY_BONUS: i32 = 3;
const VERBOSITY_AFFINITY_BONUS: i32 = 2;

/// Where a candidate came from. Variant order is tier order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    CriticalGap,
    CurrentCheck,
    UpcomingCheck,
    Warmup,
    Followup,
}

impl CandidateKind {
    pub fn tier(&self) -> u8 {
        match self {
            Self::CriticalGap => 1,
            Self::CurrentCheck => 2,
            Self::UpcomingCheck => 3,
            Self::Warmup | Self::Followup => 4,
        }
    }
}

impl_label!(CandidateKind {
    CriticalGap => "critical_gap",
    CurrentCheck => "current_check",
    UpcomingCheck => "upcoming_check",
    Warmup => "warmup",
    Followup => "followup",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Factual,
    Reflective,
    Social,
    Actionable,
}

impl_label!(QuestionType {
    Factual => "factual",
    Reflective => "reflective",
    Social => "social",
    Actionable => "actionable",
});

impl QuestionType {
    /// The question type a field is naturally asked with.
    pub fn for_field(field: &str) -> Self {
        match field {
            "goal" | "primary_goal" | "current_goal" | "activity_level" | "training_days" => {
                Self::Actionable
            }
            "motivation" | "barriers" | "mood_score" | "mood" => Self::Reflective,
            _ => Self::Factual,
        }
    }
}

/// A possible next question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// A field name, a check id, or a conversational topic.
    pub topic: String,
    pub check_id: Option<String>,
    pub description: Option<String>,
    pub missing_fields: Vec<String>,
    pub example_questions: Vec<String>,
    pub question_type: QuestionType,
    pub sensitive: bool,
    /// Earlier turns on this check that produced nothing new.
    pub attempt: u32,
    pub score: i32,
}

impl Candidate {
    pub fn tier(&self) -> u8 {
        self.kind.tier()
    }

    fn for_check(kind: CandidateKind, check: &Check, missing: Vec<String>, attempt: u32) -> Self {
        let question_type = missing
            .first()
            .map_or(QuestionType::Factual, |f| QuestionType::for_field(f));
        Self {
            kind,
            topic: check.check_id.clone(),
            check_id: Some(check.check_id.clone()),
            description: Some(check.description.clone()),
            missing_fields: missing,
            example_questions: check.example_questions.clone(),
            question_type,
            sensitive: check.sensitive,
            attempt,
            score: 0,
        }
    }

    fn conversational(kind: CandidateKind, topic: &str, question_type: QuestionType) -> Self {
        Self {
            kind,
            topic: topic.to_string(),
            check_id: None,
            description: None,
            missing_fields: Vec::new(),
            example_questions: Vec::new(),
            question_type,
            sensitive: false,
            attempt: 0,
            score: 0,
        }
    }
}

/// Everything the selector reads about the session.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub checklist: Option<&'a ChecklistInstance>,
    /// Fields already extracted for the focused check on earlier turns.
    pub partial_fields: &'a ExtractedData,
    pub attempts: &'a BTreeMap<String, u32>,
    pub state: &'a ConversationState,
}

/// Fields that must be gathered early in each phase.
pub fn critical_fields(phase: ConversationPhase) -> &'static [&'static str] {
    match phase {
        ConversationPhase::Warmup => &["first_name"],
        ConversationPhase::Profiling => &["age", "height", "weight"],
        ConversationPhase::Assessment => &["goal", "activity_level"],
        ConversationPhase::Planning => &["training_days", "motivation"],
        ConversationPhase::Implementation => &[],
    }
}

fn type_affinity(personality: PersonalityType) -> QuestionType {
    match personality {
        PersonalityType::Analytical => QuestionType::Factual,
        PersonalityType::Emotional => QuestionType::Reflective,
        PersonalityType::Social => QuestionType::Social,
        PersonalityType::Practical => QuestionType::Actionable,
    }
}

fn verbosity_affinity(verbosity: Verbosity, question_type: QuestionType) -> bool {
    use QuestionType::*;
    match verbosity {
        Verbosity::Brief => matches!(question_type, Factual | Actionable),
        Verbosity::Moderate => matches!(question_type, Factual | Social),
        Verbosity::Detailed => matches!(question_type, Reflective | Social),
    }
}

/// Picks the next question. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionSelector;

impl QuestionSelector {
    pub fn new() -> Self {
        Self
    }

    /// The best candidate from the highest non-empty tier.
    ///
    /// Sensitive candidates are dropped while the user seems uncomfortable;
    /// a tier left empty by that falls through to the next one.
    pub fn select(
        &self,
        input: &SelectionInput<'_>,
        profile: &PersonalityProfile,
        style: &WritingStyle,
    ) -> Option<Candidate> {
        let low_comfort = style.is_low_comfort();
        let tiers = [
            self.critical_gaps(input),
            self.current_check(input),
            self.upcoming_checks(input),
            self.conversational(input),
        ];

        for tier in tiers {
            let scored: Vec<Candidate> = tier
                .into_iter()
                .filter(|c| !(low_comfort && c.sensitive))
                .map(|mut c| {
                    c.score = Self::score(&c, profile, style);
                    c
                })
                .collect();
            if let Some(best) = best_of(scored) {
                debug!(
                    kind = %best.kind,
                    topic = %best.topic,
                    score = best.score,
                    "Question candidate selected"
                );
                return Some(best);
            }
        }
        None
    }

    /// Personality-fit score used to break ties within a tier.
    pub fn score(candidate: &Candidate, profile: &PersonalityProfile, style: &WritingStyle) -> i32 {
        let mut score = 0;
        if type_affinity(profile.personality_type) == candidate.question_type {
            score += TYPE_AFFINITY_BONUS;
        }
        if verbosity_affinity(style.verbosity, candidate.question_type) {
            score += VERBOSITY_AFFINITY_BONUS;
        }
        score
    }

    fn missing_fields(check: &Check, partial: &ExtractedData) -> Vec<String> {
        check
            .required_data
            .iter()
            .filter(|f| !partial.contains_key(*f))
            .cloned()
            .collect()
    }

    fn attempt(input: &SelectionInput<'_>, check: &Check) -> u32 {
        input.attempts.get(&check.check_id).copied().unwrap_or(0)
    }

    /// Tier 1: missing phase-critical fields of the focused check.
    fn critical_gaps(&self, input: &SelectionInput<'_>) -> Vec<Candidate> {
        let Some(check) = input.checklist.and_then(ChecklistInstance::in_progress_check) else {
            return Vec::new();
        };
        let critical = critical_fields(input.state.phase);
        Self::missing_fields(check, input.partial_fields)
            .into_iter()
            .filter(|f| critical.contains(&f.as_str()))
            .map(|field| {
                let mut c = Candidate::for_check(
                    CandidateKind::CriticalGap,
                    check,
                    vec![field.clone()],
                    Self::attempt(input, check),
                );
                c.topic = field;
                c
            })
            .collect()
    }

    /// Tier 2: the focused check as a whole.
    fn current_check(&self, input: &SelectionInput<'_>) -> Vec<Candidate> {
        input
            .checklist
            .and_then(ChecklistInstance::in_progress_check)
            .map(|check| {
                let missing = Self::missing_fields(check, input.partial_fields);
                Candidate::for_check(
                    CandidateKind::CurrentCheck,
                    check,
                    missing,
                    Self::attempt(input, check),
                )
            })
            .into_iter()
            .collect()
    }

    /// Tier 3: eligible pending checks, only while nothing is focused.
    fn upcoming_checks(&self, input: &SelectionInput<'_>) -> Vec<Candidate> {
        let Some(checklist) = input.checklist else {
            return Vec::new();
        };
        if checklist.in_progress_check().is_some() {
            return Vec::new();
        }
        checklist
            .upcoming_checks(UPCOMING_LIMIT)
            .into_iter()
            .map(|check| {
                Candidate::for_check(
                    CandidateKind::UpcomingCheck,
                    check,
                    check.required_data.clone(),
                    Self::attempt(input, check),
                )
            })
            .collect()
    }

    /// Tier 4: rapport and followups.
    fn conversational(&self, input: &SelectionInput<'_>) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = input
            .state
            .pending_followups
            .iter()
            .filter(|topic| !topic.is_empty())
            .filter(|topic| {
                input
                    .checklist
                    .and_then(|c| c.check(topic))
                    .is_none()
            })
            .map(|topic| {
                Candidate::conversational(CandidateKind::Followup, topic, QuestionType::Reflective)
            })
            .collect();
        if input.state.phase == ConversationPhase::Warmup || candidates.is_empty() {
            candidates.push(Candidate::conversational(
                CandidateKind::Warmup,
                "rapport",
                QuestionType::Social,
            ));
        }
        candidates
    }
}

/// Highest score wins; the earliest candidate wins a tie.
fn best_of(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().fold(None, |best, c| match best {
        Some(b) if b.score >= c.score => Some(b),
        _ => Some(c),
    })
}
