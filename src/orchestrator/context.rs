//! Session context and turn outcome.
//!
//! The context is an explicit value: the orchestrator takes one in and hands
//! an updated copy back. Nothing about a session lives anywhere else.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::{ChecklistInstance, ChecklistType, ExtractedData, Facts};
use crate::flow::ConversationPhase;

/// Who said a line of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Coach,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Everything persisted for one session between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub checklist_type: ChecklistType,
    /// Loaded lazily on the first turn, then reused.
    #[serde(default)]
    pub checklist: Option<ChecklistInstance>,
    #[serde(default)]
    pub facts: Facts,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub phase: ConversationPhase,
    /// Fields extracted for the focused check on earlier turns.
    #[serde(default)]
    pub partial_fields: ExtractedData,
    /// Turns per check that produced no new field.
    #[serde(default)]
    pub attempts: BTreeMap<String, u32>,
    /// User messages over the whole session; not bounded by the history cap.
    #[serde(default)]
    pub user_turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, checklist_type: ChecklistType) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            checklist_type,
            checklist: None,
            facts: Facts::default(),
            history: Vec::new(),
            phase: ConversationPhase::Warmup,
            partial_fields: ExtractedData::new(),
            attempts: BTreeMap::new(),
            user_turn_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a line, dropping the oldest lines beyond `max_history`.
    pub fn push_turn(&mut self, role: Role, text: impl Into<String>, max_history: usize) {
        let at = Utc::now();
        if role == Role::User {
            self.user_turn_count += 1;
        }
        self.history.push(Turn {
            role,
            text: text.into(),
            at,
        });
        if self.history.len() > max_history {
            let excess = self.history.len() - max_history;
            self.history.drain(..excess);
        }
        self.updated_at = at;
    }

    /// The user's side of the stored history, oldest first.
    pub fn user_turns(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
            .collect()
    }

    pub fn progress(&self) -> f64 {
        self.checklist
            .as_ref()
            .map_or(0.0, ChecklistInstance::progress)
    }

    /// The user's first name, once known.
    pub fn first_name(&self) -> Option<&str> {
        let checklist = self.checklist.as_ref()?;
        checklist
            .checklist()
            .checks()
            .filter(|c| c.required_data.iter().any(|f| f == "first_name"))
            .find_map(|c| self.facts.get_field(&c.context_path, "first_name"))
            .and_then(|v| v.as_str())
    }
}

/// Outcome of one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Advancing,
    AwaitingCompletion,
    Completed,
    Error,
}

impl_label!(TurnStatus {
    Advancing => "advancing",
    AwaitingCompletion => "awaiting_completion",
    Completed => "completed",
    Error => "error",
});

/// Where the checklist stands after a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistStateView {
    pub current_check_id: Option<String>,
    /// Checklist phase owning the current check.
    pub phase: Option<String>,
    pub conversation_phase: ConversationPhase,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub just_completed: Option<String>,
}

impl ChecklistStateView {
    pub fn of(context: &SessionContext, just_completed: Option<String>) -> Self {
        let current = context
            .checklist
            .as_ref()
            .and_then(|c| c.find_current_check().map(|check| (c, check)));
        Self {
            current_check_id: current.map(|(_, check)| check.check_id.clone()),
            phase: current
                .and_then(|(c, check)| c.phase_of(&check.check_id))
                .map(|p| p.phase_id.clone()),
            conversation_phase: context.phase,
            progress: context.progress(),
            just_completed,
        }
    }
}

/// Reply plus the updated session, returned by every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: String,
    pub checklist_state: ChecklistStateView,
    /// The full updated context; the caller persists it.
    pub context_updates: SessionContext,
    pub status: TurnStatus,
    /// Fields recognized in this turn's input for the focused check.
    #[serde(default)]
    pub extracted: ExtractedData,
}
