//! CoachService: coordinates the session store, the orchestrator, and the
//! optional generation and retrieval backends for each turn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::checklist::{CheckState, ChecklistType, ExtractedData};
use crate::error::Result;
use crate::flow::ConversationPhase;
use crate::knowledge::{KnowledgeRetriever, KnowledgeSnippet};
use crate::llm::{TextGenerator, accept_rephrase, rephrase_prompt};
use crate::orchestrator::{
    CheckOverride, ChecklistDrivenOrchestrator, ChecklistStateView, Role, SessionContext,
    TurnOutcome, TurnStatus,
};
use crate::personality::PersonalityMapper;
use crate::store::SessionStore;
use crate::style::StyleAnalyzer;

/// What a caller gets back for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: String,
    pub response: String,
    pub status: TurnStatus,
    pub checklist_state: ChecklistStateView,
    #[serde(default)]
    pub extracted: ExtractedData,
    /// Background material for the focused check, when a retriever is set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<KnowledgeSnippet>,
    /// The response was rewritten by the text generator.
    #[serde(default)]
    pub rephrased: bool,
    pub context_updates: SessionContext,
}

/// One check's state, for status views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub check_id: String,
    pub task_id: String,
    pub state: CheckState,
}

/// Read-only snapshot of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub checklist_type: ChecklistType,
    pub checklist_name: Option<String>,
    pub conversation_phase: ConversationPhase,
    pub current_check_id: Option<String>,
    pub progress: f64,
    pub checks: Vec<CheckSummary>,
    pub facts: serde_json::Value,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionStatus {
    pub fn of(context: &SessionContext) -> Self {
        let checks = context
            .checklist
            .as_ref()
            .map(|c| {
                c.checklist()
                    .tasks()
                    .flat_map(|task| {
                        task.checks.iter().map(|check| CheckSummary {
                            check_id: check.check_id.clone(),
                            task_id: task.task_id.clone(),
                            state: check.state,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            session_id: context.session_id.clone(),
            checklist_type: context.checklist_type,
            checklist_name: context.checklist.as_ref().map(|c| c.name().to_string()),
            conversation_phase: context.phase,
            current_check_id: context
                .checklist
                .as_ref()
                .and_then(|c| c.find_current_check())
                .map(|c| c.check_id.clone()),
            progress: context.progress(),
            checks,
            facts: context.facts.as_value().clone(),
            turns: context.history.len(),
            created_at: context.created_at,
            updated_at: context.updated_at,
        }
    }
}

/// Turn service. Sessions live in the store between turns; the service
/// itself holds no per-session state.
pub struct CoachService {
    store: Arc<dyn SessionStore>,
    orchestrator: ChecklistDrivenOrchestrator,
    generator: Option<Arc<dyn TextGenerator>>,
    retriever: Option<Arc<dyn KnowledgeRetriever>>,
    knowledge_limit: usize,
    default_checklist: ChecklistType,
}

impl CoachService {
    pub fn new(store: Arc<dyn SessionStore>, orchestrator: ChecklistDrivenOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
            generator: None,
            retriever: None,
            knowledge_limit: 3,
            default_checklist: ChecklistType::default(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn KnowledgeRetriever>, limit: usize) -> Self {
        self.retriever = Some(retriever);
        self.knowledge_limit = limit;
        self
    }

    pub fn with_default_checklist(mut self, checklist_type: ChecklistType) -> Self {
        self.default_checklist = checklist_type;
        self
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Create and save a fresh session, returning the opening question.
    pub async fn start_session(
        &self,
        session_id: Option<String>,
        checklist_type: Option<ChecklistType>,
    ) -> Result<TurnReply> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let checklist_type = checklist_type.unwrap_or(self.default_checklist);
        let outcome = self.orchestrator.start_session(&session_id, checklist_type);
        info!(session_id = %session_id, checklist = %checklist_type, "Session started");
        self.finish_turn(outcome).await
    }

    /// Run one user turn. Unknown sessions are created on the fly.
    pub async fn handle_turn(&self, session_id: &str, text: &str) -> Result<TurnReply> {
        let context = match self.store.load(session_id).await? {
            Some(context) => context,
            None => {
                info!(session_id, "Unknown session, creating");
                SessionContext::new(session_id, self.default_checklist)
            }
        };
        let outcome = self.orchestrator.process_user_input(&context, text);
        self.finish_turn(outcome).await
    }

    pub async fn status(&self, session_id: &str) -> Result<Option<SessionStatus>> {
        Ok(self
            .store
            .load(session_id)
            .await?
            .map(|context| SessionStatus::of(&context)))
    }

    /// Skip or fail a check on an operator's behalf. `None` for an unknown
    /// session.
    pub async fn override_check(
        &self,
        session_id: &str,
        check_id: &str,
        action: CheckOverride,
        reason: &str,
    ) -> Result<Option<SessionStatus>> {
        let Some(context) = self.store.load(session_id).await? else {
            return Ok(None);
        };
        let updated = self
            .orchestrator
            .override_check(&context, check_id, action, reason)?;
        self.store.save(session_id, &updated).await?;
        Ok(Some(SessionStatus::of(&updated)))
    }

    /// Drop a session and start it over with the same checklist.
    pub async fn reset(&self, session_id: &str) -> Result<TurnReply> {
        let checklist_type = self
            .store
            .load(session_id)
            .await?
            .map(|c| c.checklist_type);
        self.store.delete(session_id).await?;
        info!(session_id, "Session reset");
        self.start_session(Some(session_id.to_string()), checklist_type)
            .await
    }

    async fn finish_turn(&self, outcome: TurnOutcome) -> Result<TurnReply> {
        let TurnOutcome {
            mut response,
            checklist_state,
            mut context_updates,
            status,
            extracted,
        } = outcome;

        if status == TurnStatus::Error {
            // The orchestrator returned the context as it was; nothing to save.
            return Ok(TurnReply {
                session_id: context_updates.session_id.clone(),
                response,
                status,
                checklist_state,
                extracted,
                snippets: Vec::new(),
                rephrased: false,
                context_updates,
            });
        }

        let mut rephrased = false;
        if let Some(text) = self.rephrase(&context_updates, &response).await {
            if let Some(last) = context_updates.history.last_mut()
                && last.role == Role::Coach
            {
                last.text = text.clone();
            }
            response = text;
            rephrased = true;
        }
        let snippets = self.snippets_for(&context_updates).await;

        self.store
            .save(&context_updates.session_id, &context_updates)
            .await?;

        Ok(TurnReply {
            session_id: context_updates.session_id.clone(),
            response,
            status,
            checklist_state,
            extracted,
            snippets,
            rephrased,
            context_updates,
        })
    }

    /// Rephrased reply, or `None` to keep the template text.
    async fn rephrase(&self, context: &SessionContext, reply: &str) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let turns = context.user_turns();
        let window = self.orchestrator.limits().history_window;
        let style = StyleAnalyzer::new().analyze_history(&turns[turns.len().saturating_sub(window)..]);
        let profile = PersonalityMapper::new().map(&style);

        match generator.complete(&rephrase_prompt(reply, &style, &profile)).await {
            Ok(text) => {
                let accepted = accept_rephrase(reply, &text);
                if accepted.is_none() {
                    warn!(model = generator.model_name(), "Rephrasing rejected, using template text");
                }
                accepted
            }
            Err(e) => {
                warn!(model = generator.model_name(), error = %e, "Rephrasing failed, using template text");
                None
            }
        }
    }

    async fn snippets_for(&self, context: &SessionContext) -> Vec<KnowledgeSnippet> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        let Some(check) = context
            .checklist
            .as_ref()
            .and_then(|c| c.in_progress_check())
        else {
            return Vec::new();
        };
        match retriever.search(&check.description, self.knowledge_limit).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!(check_id = %check.check_id, error = %e, "Knowledge retrieval failed");
                Vec::new()
            }
        }
    }
}
