//! Checklist data model: phases → tasks → checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a single check.
///
/// Progresses `pending → in_progress → completed`. `failed` and `skipped`
/// are terminal and only reachable through an operator override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl CheckState {
    /// Check if a transition from `self` to `target` is valid. Never backward.
    pub fn can_transition_to(&self, target: CheckState) -> bool {
        use CheckState::*;
        matches!(
            (self, target),
            (Pending, InProgress)
                | (InProgress, Completed)
                | (Pending, Skipped)
                | (InProgress, Skipped)
                | (Pending, Failed)
                | (InProgress, Failed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// Whether this state lets dependent tasks start.
    ///
    /// Skipped checks were waived by an operator, so they unblock dependents.
    /// Failed checks do not.
    pub fn satisfies_dependency(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

impl_label!(CheckState {
    Pending => "pending",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
});

/// The smallest unit of required information, e.g. "collect age".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub check_id: String,
    pub description: String,
    /// Field names that must all be extracted before the check completes.
    #[serde(default)]
    pub required_data: Vec<String>,
    #[serde(default)]
    pub example_questions: Vec<String>,
    /// Dot-path into the session facts where extracted fields are written.
    pub context_path: String,
    /// Sensitive topics are never raised while the user seems uncomfortable.
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub state: CheckState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A named group of checks, optionally gated on other tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub checks: Vec<Check>,
}

impl Task {
    /// Whether every check in this task lets dependents proceed.
    pub fn is_satisfied(&self) -> bool {
        self.checks.iter().all(|c| c.state.satisfies_dependency())
    }
}

/// Top-level grouping of tasks, e.g. "Assessment".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub phase_id: String,
    pub title: String,
    pub tasks: Vec<Task>,
}

/// A checklist template. Its checks carry state once loaded into a
/// [`ChecklistInstance`](super::ChecklistInstance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub phases: Vec<Phase>,
}

impl Checklist {
    /// All tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases.iter().flat_map(|p| p.tasks.iter())
    }

    /// All checks in declaration order.
    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.tasks().flat_map(|t| t.checks.iter())
    }

    pub fn total_checks(&self) -> usize {
        self.checks().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use CheckState::*;
        let transitions = [
            (Pending, InProgress),
            (InProgress, Completed),
            (Pending, Skipped),
            (InProgress, Skipped),
            (Pending, Failed),
            (InProgress, Failed),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn labels_match_serde() {
        use CheckState::*;
        for state in [Pending, InProgress, Completed, Failed, Skipped] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
            assert_eq!(state.to_string(), state.as_str());
        }
    }

    #[test]
    fn never_transitions_backward() {
        use CheckState::*;
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Skipped.can_transition_to(InProgress));
        assert!(!Failed.can_transition_to(Pending));
        // Pending cannot jump straight to completed
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states() {
        assert!(CheckState::Completed.is_terminal());
        assert!(CheckState::Failed.is_terminal());
        assert!(CheckState::Skipped.is_terminal());
        assert!(!CheckState::Pending.is_terminal());
        assert!(!CheckState::InProgress.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        use CheckState::*;
        for state in [Pending, InProgress, Completed, Failed, Skipped] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{state}\""), json);
        }
    }

    #[test]
    fn check_defaults_when_deserialized_from_template() {
        let json = r#"{
            "check_id": "name",
            "description": "Collect the user's first name",
            "required_data": ["first_name"],
            "context_path": "profile.identity"
        }"#;
        let check: Check = serde_json::from_str(json).unwrap();
        assert_eq!(check.state, CheckState::Pending);
        assert!(check.notes.is_empty());
        assert!(check.timestamp.is_none());
        assert!(!check.sensitive);
        assert!(check.example_questions.is_empty());
    }
}
