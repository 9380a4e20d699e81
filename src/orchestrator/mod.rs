//! ChecklistDrivenOrchestrator: runs one conversational turn end to end.
//!
//! A turn reads the user's style, makes sure a checklist is loaded, extracts
//! the focused check's fields from the message and either completes the check
//! and moves on, or asks again for what is missing. Every turn works on a
//! clone of the incoming [`SessionContext`]; the clone is only handed back when
//! the turn succeeds.

pub mod context;

pub use context::{ChecklistStateView, Role, SessionContext, Turn, TurnOutcome, TurnStatus};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::checklist::{
    Check, ChecklistEngine, ChecklistInstance, ChecklistType, ExtractedData, TemplateSource,
};
use crate::error::ChecklistError;
use crate::flow::{ConversationState, FlowManager, InteractionStyle};
use crate::personality::{PersonalityMapper, PersonalityProfile};
use crate::questions::{
    APOLOGY, Candidate, QuestionGenerator, QuestionSelector, ResponseComposer, SelectionInput,
};
use crate::style::{StyleAnalyzer, WritingStyle};

/// History bounds applied by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorLimits {
    /// User turns fed to style analysis.
    pub history_window: usize,
    /// Turns kept in the session history.
    pub max_history: usize,
}

impl Default for OrchestratorLimits {
    fn default() -> Self {
        Self {
            history_window: 5,
            max_history: 50,
        }
    }
}

/// Operator action on a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOverride {
    Skip,
    Fail,
}

impl_label!(CheckOverride {
    Skip => "skip",
    Fail => "fail",
});

/// Per-turn reading of the user and the conversation.
struct TurnView {
    style: WritingStyle,
    profile: PersonalityProfile,
    state: ConversationState,
    interaction: InteractionStyle,
}

pub struct ChecklistDrivenOrchestrator {
    templates: Arc<dyn TemplateSource>,
    engine: ChecklistEngine,
    analyzer: StyleAnalyzer,
    mapper: PersonalityMapper,
    flow: FlowManager,
    selector: QuestionSelector,
    generator: QuestionGenerator,
    composer: ResponseComposer,
    limits: OrchestratorLimits,
}

impl ChecklistDrivenOrchestrator {
    pub fn new(templates: Arc<dyn TemplateSource>) -> Self {
        Self {
            templates,
            engine: ChecklistEngine::default(),
            analyzer: StyleAnalyzer::new(),
            mapper: PersonalityMapper::new(),
            flow: FlowManager::new(),
            selector: QuestionSelector::new(),
            generator: QuestionGenerator::new(),
            composer: ResponseComposer::new(),
            limits: OrchestratorLimits::default(),
        }
    }

    /// Replace the engine, e.g. to use a custom extractor registry.
    pub fn with_engine(mut self, engine: ChecklistEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_limits(mut self, limits: OrchestratorLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn engine(&self) -> &ChecklistEngine {
        &self.engine
    }

    pub fn limits(&self) -> OrchestratorLimits {
        self.limits
    }

    /// Create a context for a new session and ask the first question.
    pub fn start_session(
        &self,
        session_id: impl Into<String>,
        checklist_type: ChecklistType,
    ) -> TurnOutcome {
        let context = SessionContext::new(session_id, checklist_type);
        match self.open(context.clone()) {
            Ok(outcome) => outcome,
            Err(e) => self.failed_turn(&context, &e),
        }
    }

    /// Process one user message against `context`.
    ///
    /// Never fails: checklist errors become an apology with
    /// [`TurnStatus::Error`] and the input context returned unchanged.
    pub fn process_user_input(&self, context: &SessionContext, text: &str) -> TurnOutcome {
        match self.run_turn(context.clone(), text) {
            Ok(outcome) => outcome,
            Err(e) => self.failed_turn(context, &e),
        }
    }

    /// Apply an operator override and return the updated context.
    pub fn override_check(
        &self,
        context: &SessionContext,
        check_id: &str,
        action: CheckOverride,
        reason: &str,
    ) -> Result<SessionContext, ChecklistError> {
        let mut ctx = context.clone();
        self.ensure_checklist(&mut ctx)?;
        let checklist = ctx.checklist.as_mut().ok_or(ChecklistError::NotLoaded)?;
        let was_focused = checklist
            .in_progress_check()
            .is_some_and(|c| c.check_id == check_id);
        match action {
            CheckOverride::Skip => checklist.skip_check(check_id, reason)?,
            CheckOverride::Fail => checklist.fail_check(check_id, reason)?,
        }
        if was_focused {
            ctx.partial_fields.clear();
        }
        ctx.attempts.remove(check_id);
        ctx.updated_at = chrono::Utc::now();
        Ok(ctx)
    }

    fn open(&self, mut ctx: SessionContext) -> Result<TurnOutcome, ChecklistError> {
        self.ensure_checklist(&mut ctx)?;
        let view = self.read_conversation(&mut ctx);
        let focused = Self::focus(&mut ctx)?;
        info!(
            session_id = %ctx.session_id,
            checklist = %ctx.checklist_type,
            "Session opened"
        );
        if focused.is_none() {
            return Ok(self.exhausted(ctx, None, ExtractedData::new()));
        }
        let (_, question) = self.next_question(&ctx, &view);
        let name = ctx.checklist.as_ref().map_or("", |c| c.name());
        let response = self.composer.opening(name, &question);
        Ok(self.reply(ctx, response, TurnStatus::Advancing, None, ExtractedData::new()))
    }

    fn run_turn(&self, mut ctx: SessionContext, text: &str) -> Result<TurnOutcome, ChecklistError> {
        ctx.push_turn(Role::User, text, self.limits.max_history);
        self.ensure_checklist(&mut ctx)?;

        let Some(current) = Self::focus(&mut ctx)? else {
            self.read_conversation(&mut ctx);
            return Ok(self.exhausted(ctx, None, ExtractedData::new()));
        };

        let extracted = self.engine.extract(text, &current.required_data);
        ctx.partial_fields
            .retain(|field, _| current.required_data.contains(field));
        let made_progress = extracted
            .iter()
            .any(|(field, value)| ctx.partial_fields.get(field) != Some(value));
        let mut merged = ctx.partial_fields.clone();
        merged.extend(extracted.iter().map(|(k, v)| (k.clone(), v.clone())));

        if ChecklistEngine::is_complete(&current, &merged) {
            self.complete_current(ctx, &current, &merged, extracted)
        } else {
            ctx.partial_fields = merged;
            if !made_progress {
                *ctx.attempts.entry(current.check_id.clone()).or_insert(0) += 1;
            }
            self.request_completion(ctx, &current, made_progress, extracted)
        }
    }

    fn complete_current(
        &self,
        mut ctx: SessionContext,
        current: &Check,
        merged: &ExtractedData,
        extracted: ExtractedData,
    ) -> Result<TurnOutcome, ChecklistError> {
        let checklist = ctx.checklist.as_mut().ok_or(ChecklistError::NotLoaded)?;
        checklist.complete(&current.check_id, merged, &mut ctx.facts)?;
        let next = checklist.advance().map(|c| c.check_id.clone());
        ctx.partial_fields.clear();
        ctx.attempts.remove(&current.check_id);

        let view = self.read_conversation(&mut ctx);
        let just_completed = Some(current.check_id.clone());
        if next.is_none() {
            return Ok(self.exhausted(ctx, just_completed, extracted));
        }

        let (_, question) = self.next_question(&ctx, &view);
        let new_name = merged.get("first_name").and_then(|v| v.as_str());
        let response = self.composer.advancement(
            view.profile.personality_type,
            &view.style,
            new_name,
            &question,
        );
        Ok(self.reply(ctx, response, TurnStatus::Advancing, just_completed, extracted))
    }

    fn request_completion(
        &self,
        mut ctx: SessionContext,
        current: &Check,
        made_progress: bool,
        extracted: ExtractedData,
    ) -> Result<TurnOutcome, ChecklistError> {
        let view = self.read_conversation(&mut ctx);
        let (candidate, question) = self.next_question(&ctx, &view);

        // A rapport question stands in for the check while the user seems
        // uncomfortable; don't list the check's fields next to it.
        let on_current = candidate
            .as_ref()
            .is_some_and(|c| c.check_id.as_deref() == Some(current.check_id.as_str()));
        let missing: Vec<String> = if on_current {
            current
                .required_data
                .iter()
                .filter(|f| !ctx.partial_fields.contains_key(*f))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        let attempt = ctx.attempts.get(&current.check_id).copied().unwrap_or(0);
        let response = self
            .composer
            .completion_request(&missing, made_progress, attempt, &question);
        Ok(self.reply(ctx, response, TurnStatus::AwaitingCompletion, None, extracted))
    }

    /// Load the session's checklist on first use.
    fn ensure_checklist(&self, ctx: &mut SessionContext) -> Result<(), ChecklistError> {
        if ctx.checklist.is_none() {
            let template = self.templates.load_template(ctx.checklist_type)?;
            ctx.checklist = Some(self.engine.load(&template)?);
        }
        Ok(())
    }

    /// Focus and return the current check; `None` once nothing is left.
    fn focus(ctx: &mut SessionContext) -> Result<Option<Check>, ChecklistError> {
        let checklist = ctx.checklist.as_mut().ok_or(ChecklistError::NotLoaded)?;
        Ok(checklist.advance().cloned())
    }

    /// Analyze the user and the conversation; moves `ctx.phase` forward.
    fn read_conversation(&self, ctx: &mut SessionContext) -> TurnView {
        let turns = ctx.user_turns();
        let recent = &turns[turns.len().saturating_sub(self.limits.history_window)..];
        let style = self.analyzer.analyze_history(recent);
        let profile = self.mapper.map(&style);

        let mut state = self.flow.assess(
            &turns,
            ctx.user_turn_count,
            ctx.checklist.as_ref(),
            &profile,
        );
        state.phase = state.phase.max(ctx.phase);
        if state.turn_count > 0
            && let Some(next) = self.flow.should_transition_phase(&state)
        {
            state.phase = next;
        }
        if state.phase != ctx.phase {
            info!(
                session_id = %ctx.session_id,
                from = %ctx.phase,
                to = %state.phase,
                "Conversation phase changed"
            );
            ctx.phase = state.phase;
        }
        let interaction = self.flow.recommend_interaction_style(&state, &profile);
        TurnView {
            style,
            profile,
            state,
            interaction,
        }
    }

    fn next_question(&self, ctx: &SessionContext, view: &TurnView) -> (Option<Candidate>, String) {
        let input = SelectionInput {
            checklist: ctx.checklist.as_ref(),
            partial_fields: &ctx.partial_fields,
            attempts: &ctx.attempts,
            state: &view.state,
        };
        let candidate = self.selector.select(&input, &view.profile, &view.style);
        let question = match &candidate {
            Some(c) => self.generator.render(
                c,
                &view.profile,
                &view.style,
                &view.state,
                &view.interaction,
            ),
            None => String::new(),
        };
        (candidate, question)
    }

    /// Nothing is left to ask. Finished checklists complete; checks held back
    /// by a failed dependency keep the session awaiting an operator.
    fn exhausted(
        &self,
        ctx: SessionContext,
        just_completed: Option<String>,
        extracted: ExtractedData,
    ) -> TurnOutcome {
        let name = ctx.checklist.as_ref().map_or("", |c| c.name());
        if ctx
            .checklist
            .as_ref()
            .is_some_and(ChecklistInstance::is_blocked)
        {
            warn!(session_id = %ctx.session_id, "Remaining checks blocked by a failed check");
            let response = self.composer.blocked(name, ctx.first_name());
            return self.reply(ctx, response, TurnStatus::AwaitingCompletion, just_completed, extracted);
        }
        let response = self.composer.completion(name, ctx.first_name());
        self.reply(ctx, response, TurnStatus::Completed, just_completed, extracted)
    }

    fn reply(
        &self,
        mut ctx: SessionContext,
        response: String,
        status: TurnStatus,
        just_completed: Option<String>,
        extracted: ExtractedData,
    ) -> TurnOutcome {
        ctx.push_turn(Role::Coach, response.clone(), self.limits.max_history);
        TurnOutcome {
            response,
            checklist_state: ChecklistStateView::of(&ctx, just_completed),
            context_updates: ctx,
            status,
            extracted,
        }
    }

    fn failed_turn(&self, context: &SessionContext, e: &ChecklistError) -> TurnOutcome {
        error!(session_id = %context.session_id, error = %e, "Turn failed");
        TurnOutcome {
            response: APOLOGY.to_string(),
            checklist_state: ChecklistStateView::of(context, None),
            context_updates: context.clone(),
            status: TurnStatus::Error,
            extracted: ExtractedData::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{BuiltinTemplates, CheckState, Checklist};

    struct BrokenTemplates;

    impl TemplateSource for BrokenTemplates {
        fn load_template(&self, checklist_type: ChecklistType) -> Result<Checklist, ChecklistError> {
            Err(ChecklistError::TemplateParse {
                name: checklist_type.to_string(),
                reason: "unexpected end of input".to_string(),
            })
        }
    }

    fn orchestrator() -> ChecklistDrivenOrchestrator {
        ChecklistDrivenOrchestrator::new(Arc::new(BuiltinTemplates))
    }

    #[test]
    fn start_session_focuses_first_check() {
        let outcome = orchestrator().start_session("s1", ChecklistType::Onboarding);
        assert_eq!(outcome.status, TurnStatus::Advancing);
        assert_eq!(outcome.checklist_state.current_check_id.as_deref(), Some("name"));
        assert_eq!(outcome.checklist_state.phase.as_deref(), Some("welcome"));
        assert!(outcome.response.starts_with("Hi!"));
        assert_eq!(outcome.context_updates.history.len(), 1);
    }

    #[test]
    fn name_then_age_advances() {
        let orch = orchestrator();
        let ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;

        let first = orch.process_user_input(&ctx, "Hi, my name is Ada");
        assert_eq!(first.status, TurnStatus::Advancing);
        assert_eq!(first.checklist_state.just_completed.as_deref(), Some("name"));
        assert_eq!(first.checklist_state.current_check_id.as_deref(), Some("age"));
        assert!(first.response.contains("Ada"));

        let second = orch.process_user_input(&first.context_updates, "I'm 34");
        assert_eq!(second.status, TurnStatus::Advancing);
        assert_eq!(second.checklist_state.just_completed.as_deref(), Some("age"));
        assert_eq!(
            second.context_updates.facts.get_field("profile.identity", "age"),
            Some(&serde_json::json!(34))
        );
    }

    #[test]
    fn fields_accumulate_across_turns() {
        let orch = orchestrator();
        let mut ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        for text in ["my name is Ada", "I am 34 years old"] {
            ctx = orch.process_user_input(&ctx, text).context_updates;
        }

        let partial = orch.process_user_input(&ctx, "I'm 170 cm");
        assert_eq!(partial.status, TurnStatus::AwaitingCompletion);
        assert!(partial.context_updates.partial_fields.contains_key("height"));
        assert!(partial.response.contains("weight"));

        let done = orch.process_user_input(&partial.context_updates, "65 kg");
        assert_eq!(done.checklist_state.just_completed.as_deref(), Some("body_metrics"));
        assert!(done.context_updates.partial_fields.is_empty());
    }

    #[test]
    fn unproductive_turns_count_attempts() {
        let orch = orchestrator();
        let ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        let once = orch.process_user_input(&ctx, "hmm not sure");
        let twice = orch.process_user_input(&once.context_updates, "what do you mean");
        assert_eq!(twice.status, TurnStatus::AwaitingCompletion);
        assert_eq!(twice.context_updates.attempts.get("name"), Some(&2));
        assert!(twice.response.contains("first name"));
    }

    #[test]
    fn template_failure_returns_input_context() {
        let orch = ChecklistDrivenOrchestrator::new(Arc::new(BrokenTemplates));
        let ctx = SessionContext::new("s1", ChecklistType::Onboarding);
        let outcome = orch.process_user_input(&ctx, "my name is Ada");
        assert_eq!(outcome.status, TurnStatus::Error);
        assert_eq!(outcome.response, APOLOGY);
        assert_eq!(outcome.context_updates, ctx);
    }

    #[test]
    fn skip_override_moves_focus() {
        let orch = orchestrator();
        let ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        let updated = orch
            .override_check(&ctx, "name", CheckOverride::Skip, "user declined")
            .unwrap();
        let checklist = updated.checklist.as_ref().unwrap();
        assert_eq!(checklist.check("name").unwrap().state, CheckState::Skipped);
        assert_eq!(checklist.in_progress_check().unwrap().check_id, "age");
        // The input context is untouched.
        assert_eq!(
            ctx.checklist.as_ref().unwrap().check("name").unwrap().state,
            CheckState::InProgress
        );
    }

    #[test]
    fn override_unknown_check_is_an_error() {
        let orch = orchestrator();
        let ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        let err = orch
            .override_check(&ctx, "nope", CheckOverride::Fail, "")
            .unwrap_err();
        assert!(matches!(err, ChecklistError::UnknownCheck { .. }));
    }

    #[test]
    fn failed_check_blocks_instead_of_completing() {
        let orch = orchestrator();
        let mut ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        for check_id in ["name", "age"] {
            ctx = orch
                .override_check(&ctx, check_id, CheckOverride::Fail, "no answer")
                .unwrap();
        }

        let outcome = orch.process_user_input(&ctx, "I'm 170 cm and 65 kg");
        assert_eq!(outcome.status, TurnStatus::AwaitingCompletion);
        assert_eq!(outcome.checklist_state.current_check_id, None);
        assert_eq!(outcome.checklist_state.progress, 0.0);
        assert!(!outcome.response.contains("everything I needed"));
        let checklist = outcome.context_updates.checklist.as_ref().unwrap();
        assert_eq!(checklist.check("body_metrics").unwrap().state, CheckState::Pending);
    }

    #[test]
    fn phase_follows_session_turns_past_history_cap() {
        let orch = orchestrator().with_limits(OrchestratorLimits {
            history_window: 5,
            max_history: 4,
        });
        let mut ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        for _ in 0..10 {
            ctx = orch.process_user_input(&ctx, "ok").context_updates;
        }
        assert_eq!(ctx.history.len(), 4);
        assert_eq!(ctx.user_turn_count, 10);
        assert_eq!(ctx.phase, crate::flow::ConversationPhase::Assessment);
    }

    #[test]
    fn phase_never_moves_backward() {
        let orch = orchestrator();
        let mut ctx = orch.start_session("s1", ChecklistType::Onboarding).context_updates;
        let mut last = ctx.phase;
        for text in ["my name is Ada", "34", "ok", "fine"] {
            ctx = orch.process_user_input(&ctx, text).context_updates;
            assert!(ctx.phase >= last);
            last = ctx.phase;
        }
    }
}
