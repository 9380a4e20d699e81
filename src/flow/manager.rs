//! Flow manager: phase assessment, engagement scoring and interaction style.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checklist::ChecklistInstance;
use crate::personality::{
    CommunicationPreference, PersonalityProfile, PersonalityType, SupportLevel,
};
use crate::style::TextFeatures;

use super::state::{ConversationPhase, ConversationState, Engagement};

/// How many recent user turns feed the engagement score.
const ENGAGEMENT_WINDOW: usize = 3;
const LONG_ANSWER_WEIGHT: f64 = 0.4;
const QUESTION_WEIGHT: f64 = 0.3;
const FIRST_PERSON_WEIGHT: f64 = 0.3;
const LONG_ANSWER_WORDS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Warm,
    Encouraging,
    Supportive,
    Professional,
    Direct,
}

impl_label!(Tone {
    Warm => "warm",
    Encouraging => "encouraging",
    Supportive => "supportive",
    Professional => "professional",
    Direct => "direct",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStyle {
    Open,
    Guided,
    Specific,
}

impl_label!(QuestionStyle {
    Open => "open",
    Guided => "guided",
    Specific => "specific",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Slow,
    Moderate,
    Fast,
}

impl_label!(Pace {
    Slow => "slow",
    Moderate => "moderate",
    Fast => "fast",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Rapport,
    DataCollection,
    Goals,
    ActionPlanning,
}

impl_label!(Priority {
    Rapport => "rapport",
    DataCollection => "data_collection",
    Goals => "goals",
    ActionPlanning => "action_planning",
});

/// How the next reply should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionStyle {
    pub tone: Tone,
    pub question_style: QuestionStyle,
    pub pace: Pace,
    pub priority: Priority,
}

/// Assesses conversation state each turn. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowManager;

impl FlowManager {
    pub fn new() -> Self {
        Self
    }

    /// Build the conversation state for this turn.
    ///
    /// `recent_turns` is the retained user side of the history, oldest first,
    /// including the current message. `turn_count` counts every user message
    /// of the session, including ones the history no longer holds.
    pub fn assess<S: AsRef<str>>(
        &self,
        recent_turns: &[S],
        turn_count: usize,
        checklist: Option<&ChecklistInstance>,
        profile: &PersonalityProfile,
    ) -> ConversationState {
        let engagement_score = engagement_score(recent_turns);
        let completeness = checklist.map_or(0.0, ChecklistInstance::completeness);

        let relationship_strength = ((0.1 * turn_count as f64).min(0.5)
            + 0.3 * engagement_score
            + 0.2 * completeness)
            .clamp(0.0, 1.0);

        let last_topic = checklist
            .and_then(ChecklistInstance::find_current_check)
            .map(|c| c.check_id.clone());
        let mut pending_followups: Vec<String> = checklist
            .map(|c| {
                c.upcoming_checks(3)
                    .into_iter()
                    .filter(|check| Some(&check.check_id) != last_topic.as_ref())
                    .map(|check| check.check_id.clone())
                    .collect()
            })
            .unwrap_or_default();
        if profile.support_needs == SupportLevel::High {
            pending_followups.push("wellbeing".to_string());
        }

        let state = ConversationState {
            phase: phase_for(turn_count, completeness),
            turn_count,
            user_engagement: Engagement::from_score(engagement_score),
            engagement_score,
            information_completeness: completeness,
            relationship_strength,
            last_topic,
            pending_followups,
        };
        debug!(
            phase = %state.phase,
            turns = state.turn_count,
            engagement = %state.user_engagement,
            completeness = state.information_completeness,
            "Conversation assessed"
        );
        state
    }

    /// The phase to move to, if the current phase's exit condition holds.
    pub fn should_transition_phase(&self, state: &ConversationState) -> Option<ConversationPhase> {
        use ConversationPhase::*;
        let exit = match state.phase {
            Warmup => state.user_engagement >= Engagement::Medium || state.turn_count >= 3,
            Profiling => state.turn_count >= 8 || state.information_completeness >= 0.3,
            Assessment => state.information_completeness >= 0.7,
            Planning => state.information_completeness >= 0.9,
            Implementation => false,
        };
        if exit { state.phase.next() } else { None }
    }

    /// Phase defaults, then profile and engagement overrides.
    pub fn recommend_interaction_style(
        &self,
        state: &ConversationState,
        profile: &PersonalityProfile,
    ) -> InteractionStyle {
        use ConversationPhase::*;
        let mut style = match state.phase {
            Warmup => InteractionStyle {
                tone: Tone::Warm,
                question_style: QuestionStyle::Open,
                pace: Pace::Slow,
                priority: Priority::Rapport,
            },
            Profiling => InteractionStyle {
                tone: Tone::Encouraging,
                question_style: QuestionStyle::Guided,
                pace: Pace::Moderate,
                priority: Priority::DataCollection,
            },
            Assessment => InteractionStyle {
                tone: Tone::Professional,
                question_style: QuestionStyle::Specific,
                pace: Pace::Moderate,
                priority: Priority::DataCollection,
            },
            Planning => InteractionStyle {
                tone: Tone::Encouraging,
                question_style: QuestionStyle::Guided,
                pace: Pace::Moderate,
                priority: Priority::Goals,
            },
            Implementation => InteractionStyle {
                tone: Tone::Direct,
                question_style: QuestionStyle::Specific,
                pace: Pace::Fast,
                priority: Priority::ActionPlanning,
            },
        };

        match profile.communication_preference {
            CommunicationPreference::Direct => {
                style.question_style = QuestionStyle::Specific;
                style.pace = Pace::Fast;
            }
            CommunicationPreference::Detailed => style.question_style = QuestionStyle::Guided,
            CommunicationPreference::Supportive => style.tone = Tone::Supportive,
            CommunicationPreference::Conversational => {}
        }
        if profile.personality_type == PersonalityType::Analytical {
            style.question_style = QuestionStyle::Specific;
        }

        let needs_support = profile.support_needs == SupportLevel::High
            || profile.personality_type == PersonalityType::Emotional;
        if needs_support {
            style.tone = Tone::Supportive;
        }

        if state.user_engagement == Engagement::Low {
            style.tone = Tone::Supportive;
            style.pace = Pace::Slow;
        } else if state.relationship_strength >= 0.7 && !needs_support {
            style.tone = Tone::Direct;
        }
        style
    }
}

/// Weighted signal count over the last turns, normalized to `[0, 1]`.
/// With no turns yet the score sits in the middle of the medium bucket.
pub fn engagement_score<S: AsRef<str>>(user_turns: &[S]) -> f64 {
    let recent = &user_turns[user_turns.len().saturating_sub(ENGAGEMENT_WINDOW)..];
    if recent.is_empty() {
        return 0.5;
    }
    let max_per_turn = LONG_ANSWER_WEIGHT + QUESTION_WEIGHT + FIRST_PERSON_WEIGHT;
    let total: f64 = recent
        .iter()
        .map(|turn| {
            let f = TextFeatures::from_text(turn.as_ref());
            let mut score = 0.0;
            if f.words > LONG_ANSWER_WORDS {
                score += LONG_ANSWER_WEIGHT;
            }
            if f.questions > 0.0 {
                score += QUESTION_WEIGHT;
            }
            if f.first_person > 0.0 {
                score += FIRST_PERSON_WEIGHT;
            }
            score
        })
        .sum();
    total / (max_per_turn * recent.len() as f64)
}

/// Turn-count phases first, then completeness thresholds.
fn phase_for(turn_count: usize, completeness: f64) -> ConversationPhase {
    if turn_count <= 3 {
        ConversationPhase::Warmup
    } else if turn_count <= 8 {
        ConversationPhase::Profiling
    } else if completeness < 0.7 {
        ConversationPhase::Assessment
    } else if completeness < 0.9 {
        ConversationPhase::Planning
    } else {
        ConversationPhase::Implementation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{BuiltinTemplates, ChecklistEngine, ChecklistType, TemplateSource};

    fn turns(n: usize, text: &str) -> Vec<String> {
        vec![text.to_string(); n]
    }

    #[test]
    fn phase_by_turn_count_then_completeness() {
        assert_eq!(phase_for(0, 0.0), ConversationPhase::Warmup);
        assert_eq!(phase_for(3, 1.0), ConversationPhase::Warmup);
        assert_eq!(phase_for(4, 0.0), ConversationPhase::Profiling);
        assert_eq!(phase_for(8, 0.0), ConversationPhase::Profiling);
        assert_eq!(phase_for(9, 0.5), ConversationPhase::Assessment);
        assert_eq!(phase_for(9, 0.7), ConversationPhase::Planning);
        assert_eq!(phase_for(12, 0.95), ConversationPhase::Implementation);
    }

    #[test]
    fn engagement_scoring() {
        assert_eq!(engagement_score::<&str>(&[]), 0.5);
        assert_eq!(engagement_score(&["ok", "yes", "fine"]), 0.0);
        let engaged = "I have been training for years but I keep getting stuck, what should I change?";
        assert!((engagement_score(&[engaged]) - 1.0).abs() < 1e-9);
        // Only the last three turns count.
        assert_eq!(engagement_score(&[engaged, "ok", "no", "fine"]), 0.0);
    }

    #[test]
    fn assess_reads_checklist() {
        let template = BuiltinTemplates.load_template(ChecklistType::Onboarding).unwrap();
        let instance = ChecklistEngine::default().load(&template).unwrap();
        let state = FlowManager::new().assess(
            &turns(2, "ciao"),
            2,
            Some(&instance),
            &PersonalityProfile::default(),
        );
        assert_eq!(state.phase, ConversationPhase::Warmup);
        assert_eq!(state.turn_count, 2);
        assert_eq!(state.last_topic.as_deref(), Some("name"));
        assert_eq!(state.pending_followups, vec!["age".to_string()]);
        assert_eq!(state.information_completeness, 0.0);
        assert!(state.relationship_strength <= 1.0);
    }

    #[test]
    fn relationship_strength_formula() {
        let state = FlowManager::new().assess(
            &turns(10, "ok"),
            10,
            None,
            &PersonalityProfile::default(),
        );
        // 0.5 (capped turns) + 0.3 * 0.0 + 0.2 * 0.0
        assert!((state.relationship_strength - 0.5).abs() < 1e-9);
        assert_eq!(state.user_engagement, Engagement::Low);
    }

    #[test]
    fn turn_count_outlives_retained_history() {
        let state = FlowManager::new().assess(
            &turns(3, "ok"),
            12,
            None,
            &PersonalityProfile::default(),
        );
        assert_eq!(state.turn_count, 12);
        assert_eq!(state.phase, ConversationPhase::Assessment);
        assert_eq!(state.user_engagement, Engagement::Low);
    }

    #[test]
    fn exit_conditions() {
        let flow = FlowManager::new();
        let mut state = ConversationState {
            user_engagement: Engagement::Low,
            turn_count: 1,
            ..ConversationState::default()
        };
        assert_eq!(flow.should_transition_phase(&state), None);
        state.user_engagement = Engagement::Medium;
        assert_eq!(flow.should_transition_phase(&state), Some(ConversationPhase::Profiling));

        state.phase = ConversationPhase::Assessment;
        state.information_completeness = 0.69;
        assert_eq!(flow.should_transition_phase(&state), None);
        state.information_completeness = 0.7;
        assert_eq!(flow.should_transition_phase(&state), Some(ConversationPhase::Planning));

        state.phase = ConversationPhase::Implementation;
        state.information_completeness = 1.0;
        assert_eq!(flow.should_transition_phase(&state), None);
    }

    #[test]
    fn low_engagement_softens_style() {
        let flow = FlowManager::new();
        let state = ConversationState {
            phase: ConversationPhase::Assessment,
            user_engagement: Engagement::Low,
            ..ConversationState::default()
        };
        let style = flow.recommend_interaction_style(&state, &PersonalityProfile::default());
        assert_eq!(style.tone, Tone::Supportive);
        assert_eq!(style.pace, Pace::Slow);
        assert_eq!(style.priority, Priority::DataCollection);
    }

    #[test]
    fn strong_relationship_allows_directness() {
        let flow = FlowManager::new();
        let state = ConversationState {
            phase: ConversationPhase::Planning,
            user_engagement: Engagement::High,
            relationship_strength: 0.8,
            ..ConversationState::default()
        };
        let style = flow.recommend_interaction_style(&state, &PersonalityProfile::default());
        assert_eq!(style.tone, Tone::Direct);

        let anxious = PersonalityProfile {
            support_needs: SupportLevel::High,
            ..PersonalityProfile::default()
        };
        assert_eq!(flow.recommend_interaction_style(&state, &anxious).tone, Tone::Supportive);
    }

    #[test]
    fn brief_profile_gets_specific_questions() {
        let flow = FlowManager::new();
        let profile = PersonalityProfile {
            communication_preference: CommunicationPreference::Direct,
            ..PersonalityProfile::default()
        };
        let style = flow.recommend_interaction_style(&ConversationState::default(), &profile);
        assert_eq!(style.question_style, QuestionStyle::Specific);
        assert_eq!(style.pace, Pace::Fast);
        assert_eq!(style.tone, Tone::Warm);
    }
}
