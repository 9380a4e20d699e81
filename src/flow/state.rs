//! Conversation state: the per-turn read of where the conversation stands.

use serde::{Deserialize, Serialize};

/// Conversation phases, in order. The coaching relationship moves forward
/// only: a session's phase never goes back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Warmup,
    Profiling,
    Assessment,
    Planning,
    Implementation,
}

impl ConversationPhase {
    /// The next phase, if any.
    pub fn next(&self) -> Option<ConversationPhase> {
        use ConversationPhase::*;
        match self {
            Warmup => Some(Profiling),
            Profiling => Some(Assessment),
            Assessment => Some(Planning),
            Planning => Some(Implementation),
            Implementation => None,
        }
    }

    /// Only single forward steps are valid.
    pub fn can_transition_to(&self, target: ConversationPhase) -> bool {
        self.next() == Some(target)
    }
}

impl_label!(ConversationPhase {
    Warmup => "warmup",
    Profiling => "profiling",
    Assessment => "assessment",
    Planning => "planning",
    Implementation => "implementation",
});

/// Bucketed engagement of the user over recent turns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    Low,
    #[default]
    Medium,
    High,
}

impl Engagement {
    /// `< 0.4` low, `<= 0.7` medium, above that high.
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            Self::Low
        } else if score <= 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl_label!(Engagement {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// Recomputed from scratch at the start of every turn, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub phase: ConversationPhase,
    /// User turns so far, including the current one.
    pub turn_count: usize,
    pub user_engagement: Engagement,
    pub engagement_score: f64,
    /// Completed share of the checklist in `[0, 1]`.
    pub information_completeness: f64,
    /// Rapport estimate in `[0, 1]`.
    pub relationship_strength: f64,
    pub last_topic: Option<String>,
    pub pending_followups: Vec<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            phase: ConversationPhase::Warmup,
            turn_count: 0,
            user_engagement: Engagement::Medium,
            engagement_score: 0.5,
            information_completeness: 0.0,
            relationship_strength: 0.0,
            last_topic: None,
            pending_followups: Vec::new(),
        }
    }
}
