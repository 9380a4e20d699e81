//! Checklist engine: template validation, extraction and the check state machine.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ChecklistError;

use super::extract::ExtractorRegistry;
use super::facts::{Facts, is_valid_path};
use super::model::{Check, CheckState, Checklist, Phase, Task};

/// Field values recognized in one piece of user text.
pub type ExtractedData = BTreeMap<String, Value>;

/// Stateless engine: validates templates into instances and extracts fields.
#[derive(Debug, Clone, Default)]
pub struct ChecklistEngine {
    extractors: ExtractorRegistry,
}

impl ChecklistEngine {
    pub fn new(extractors: ExtractorRegistry) -> Self {
        Self { extractors }
    }

    pub fn extractors(&self) -> &ExtractorRegistry {
        &self.extractors
    }

    /// Validate a template and instantiate it with every check `pending`,
    /// then focus the first eligible check.
    pub fn load(&self, template: &Checklist) -> Result<ChecklistInstance, ChecklistError> {
        self.validate(template)?;

        let mut checklist = template.clone();
        for phase in &mut checklist.phases {
            for task in &mut phase.tasks {
                for check in &mut task.checks {
                    check.state = CheckState::Pending;
                    check.notes.clear();
                    check.timestamp = None;
                }
            }
        }

        let mut instance = ChecklistInstance {
            checklist,
            loaded_at: Utc::now(),
        };
        let first = instance.advance().map(|c| c.check_id.clone());
        info!(
            checklist = %instance.checklist.name,
            checks = instance.total_checks(),
            first_check = first.as_deref().unwrap_or("-"),
            "Checklist loaded"
        );
        Ok(instance)
    }

    /// Run the registered extractors for `fields` over `text`.
    pub fn extract(&self, text: &str, fields: &[String]) -> ExtractedData {
        self.extractors.extract(text, fields)
    }

    /// True iff `extracted` covers every field the check requires.
    pub fn is_complete(check: &Check, extracted: &ExtractedData) -> bool {
        check
            .required_data
            .iter()
            .all(|field| extracted.contains_key(field))
    }

    fn validate(&self, template: &Checklist) -> Result<(), ChecklistError> {
        let mut task_ids = HashSet::new();
        let mut check_ids = HashSet::new();

        for task in template.tasks() {
            if !task_ids.insert(task.task_id.as_str()) {
                return Err(ChecklistError::DuplicateTaskId(task.task_id.clone()));
            }
            for check in &task.checks {
                if !check_ids.insert(check.check_id.as_str()) {
                    return Err(ChecklistError::DuplicateCheckId(check.check_id.clone()));
                }
                if !is_valid_path(&check.context_path) {
                    return Err(ChecklistError::InvalidContextPath {
                        check_id: check.check_id.clone(),
                        path: check.context_path.clone(),
                    });
                }
                if let Some(field) = check
                    .required_data
                    .iter()
                    .find(|f| !self.extractors.has(f))
                {
                    return Err(ChecklistError::UnknownField {
                        check_id: check.check_id.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        for task in template.tasks() {
            if let Some(dep) = task.depends_on.iter().find(|d| !task_ids.contains(d.as_str())) {
                return Err(ChecklistError::UnknownDependency {
                    task_id: task.task_id.clone(),
                    depends_on: dep.clone(),
                });
            }
        }

        detect_cycle(template)
    }
}

/// Depth-first search over task dependencies.
fn detect_cycle(template: &Checklist) -> Result<(), ChecklistError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        id: &'a str,
        deps: &HashMap<&'a str, &'a [String]>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), ChecklistError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => return Err(ChecklistError::DependencyCycle(id.to_string())),
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        for dep in deps.get(id).copied().unwrap_or_default() {
            visit(dep, deps, marks)?;
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    let deps: HashMap<&str, &[String]> = template
        .tasks()
        .map(|t| (t.task_id.as_str(), t.depends_on.as_slice()))
        .collect();
    let mut marks = HashMap::new();
    for task in template.tasks() {
        visit(&task.task_id, &deps, &mut marks)?;
    }
    Ok(())
}

/// A loaded checklist carrying per-check state for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistInstance {
    checklist: Checklist,
    loaded_at: DateTime<Utc>,
}

impl ChecklistInstance {
    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn name(&self) -> &str {
        &self.checklist.name
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn check(&self, check_id: &str) -> Option<&Check> {
        self.checklist.checks().find(|c| c.check_id == check_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.checklist.tasks().find(|t| t.task_id == task_id)
    }

    /// The task that owns `check_id`.
    pub fn task_of(&self, check_id: &str) -> Option<&Task> {
        self.checklist
            .tasks()
            .find(|t| t.checks.iter().any(|c| c.check_id == check_id))
    }

    /// The phase that owns `check_id`.
    pub fn phase_of(&self, check_id: &str) -> Option<&Phase> {
        self.checklist.phases.iter().find(|p| {
            p.tasks
                .iter()
                .any(|t| t.checks.iter().any(|c| c.check_id == check_id))
        })
    }

    /// Whether every task `task` depends on lets it start.
    fn dependencies_met(&self, task: &Task) -> bool {
        task.depends_on
            .iter()
            .all(|dep| self.task(dep).is_some_and(Task::is_satisfied))
    }

    /// The unique `in_progress` check, if any.
    pub fn in_progress_check(&self) -> Option<&Check> {
        self.checklist
            .checks()
            .find(|c| c.state == CheckState::InProgress)
    }

    /// Pending checks whose task dependencies are satisfied, in declaration order.
    fn eligible_pending(&self) -> impl Iterator<Item = &Check> {
        self.checklist
            .tasks()
            .filter(|t| self.dependencies_met(t))
            .flat_map(|t| t.checks.iter())
            .filter(|c| c.state == CheckState::Pending)
    }

    /// The focused check, or the next one that could be focused. `None` once
    /// nothing is left to ask.
    pub fn find_current_check(&self) -> Option<&Check> {
        self.in_progress_check()
            .or_else(|| self.eligible_pending().next())
    }

    /// Up to `limit` eligible pending checks, excluding the focused one.
    pub fn upcoming_checks(&self, limit: usize) -> Vec<&Check> {
        self.eligible_pending().take(limit).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.find_current_check().is_none()
    }

    /// Nothing can be asked, yet some checks are still `pending`: a failed
    /// dependency holds them back.
    pub fn is_blocked(&self) -> bool {
        self.is_finished()
            && self
                .checklist
                .checks()
                .any(|c| c.state == CheckState::Pending)
    }

    fn check_mut(&mut self, check_id: &str) -> Option<&mut Check> {
        self.checklist
            .phases
            .iter_mut()
            .flat_map(|p| p.tasks.iter_mut())
            .flat_map(|t| t.checks.iter_mut())
            .find(|c| c.check_id == check_id)
    }

    /// Complete the focused check: write `extracted` into `facts` at the
    /// check's context path, then mark it `completed`.
    ///
    /// Facts are written first, so a path conflict leaves both the check and
    /// the facts unchanged.
    pub fn complete(
        &mut self,
        check_id: &str,
        extracted: &ExtractedData,
        facts: &mut Facts,
    ) -> Result<(), ChecklistError> {
        let check = self
            .check(check_id)
            .ok_or_else(|| ChecklistError::UnknownCheck {
                check_id: check_id.to_string(),
            })?;
        if check.state != CheckState::InProgress {
            return Err(ChecklistError::InvalidTransition {
                check_id: check_id.to_string(),
                from: check.state,
                to: CheckState::Completed,
            });
        }
        facts.set_fields(&check.context_path, extracted)?;

        let now = Utc::now();
        let fields: Vec<&str> = extracted.keys().map(String::as_str).collect();
        if let Some(check) = self.check_mut(check_id) {
            check.state = CheckState::Completed;
            check.timestamp = Some(now);
            check.notes.push(format!(
                "extracted [{}] from user input at {}",
                fields.join(", "),
                now.to_rfc3339()
            ));
        }
        info!(check_id, fields = ?fields, "Check completed");
        Ok(())
    }

    /// Focus the next eligible check, flipping it to `in_progress`.
    ///
    /// Returns the focused check; an already focused check stays focused.
    /// `None` means the checklist is exhausted.
    pub fn advance(&mut self) -> Option<&Check> {
        if let Some(current) = self.in_progress_check() {
            let id = current.check_id.clone();
            return self.check(&id);
        }
        let next_id = self.eligible_pending().next()?.check_id.clone();
        let check = self.check_mut(&next_id)?;
        check.state = CheckState::InProgress;
        debug!(check_id = %next_id, "Check focused");
        Some(check)
    }

    /// Operator override: waive a check. Skipped checks unblock dependents.
    pub fn skip_check(&mut self, check_id: &str, reason: &str) -> Result<(), ChecklistError> {
        self.override_check(check_id, CheckState::Skipped, reason)
    }

    /// Operator override: give up on a check. Failed checks keep dependents blocked.
    pub fn fail_check(&mut self, check_id: &str, reason: &str) -> Result<(), ChecklistError> {
        self.override_check(check_id, CheckState::Failed, reason)
    }

    fn override_check(
        &mut self,
        check_id: &str,
        target: CheckState,
        reason: &str,
    ) -> Result<(), ChecklistError> {
        let check = self
            .check_mut(check_id)
            .ok_or_else(|| ChecklistError::UnknownCheck {
                check_id: check_id.to_string(),
            })?;
        if !check.state.can_transition_to(target) {
            return Err(ChecklistError::InvalidTransition {
                check_id: check_id.to_string(),
                from: check.state,
                to: target,
            });
        }
        check.state = target;
        check.timestamp = Some(Utc::now());
        check.notes.push(format!("{target} by operator: {reason}"));
        info!(check_id, state = %target, reason, "Check overridden");
        self.advance();
        Ok(())
    }

    pub fn total_checks(&self) -> usize {
        self.checklist.total_checks()
    }

    pub fn completed_checks(&self) -> usize {
        self.checklist
            .checks()
            .filter(|c| c.state == CheckState::Completed)
            .count()
    }

    /// Percentage of completed checks, `0.0` for an empty checklist.
    pub fn progress(&self) -> f64 {
        let total = self.total_checks();
        if total == 0 {
            return 0.0;
        }
        self.completed_checks() as f64 / total as f64 * 100.0
    }

    /// Completed share of checks in `[0, 1]`.
    pub fn completeness(&self) -> f64 {
        self.progress() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(id: &str, fields: &[&str], path: &str) -> Check {
        Check {
            check_id: id.to_string(),
            description: format!("collect {id}"),
            required_data: fields.iter().map(|f| f.to_string()).collect(),
            example_questions: vec![],
            context_path: path.to_string(),
            sensitive: false,
            state: CheckState::Pending,
            notes: vec![],
            timestamp: None,
        }
    }

    fn task(id: &str, depends_on: &[&str], checks: Vec<Check>) -> Task {
        Task {
            task_id: id.to_string(),
            title: id.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            checks,
        }
    }

    fn checklist(tasks: Vec<Task>) -> Checklist {
        Checklist {
            name: "test".into(),
            description: String::new(),
            phases: vec![Phase {
                phase_id: "main".into(),
                title: "Main".into(),
                tasks,
            }],
        }
    }

    fn two_step() -> Checklist {
        checklist(vec![
            task("identity", &[], vec![check("name", &["first_name"], "profile")]),
            task(
                "body",
                &["identity"],
                vec![check("age", &["age"], "profile.body")],
            ),
        ])
    }

    fn data(pairs: &[(&str, Value)]) -> ExtractedData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn in_progress_count(instance: &ChecklistInstance) -> usize {
        instance
            .checklist()
            .checks()
            .filter(|c| c.state == CheckState::InProgress)
            .count()
    }

    #[test]
    fn load_focuses_first_check() {
        let engine = ChecklistEngine::default();
        let instance = engine.load(&two_step()).unwrap();
        assert_eq!(instance.find_current_check().unwrap().check_id, "name");
        assert_eq!(instance.check("name").unwrap().state, CheckState::InProgress);
        assert_eq!(instance.check("age").unwrap().state, CheckState::Pending);
        assert_eq!(instance.progress(), 0.0);
    }

    #[test]
    fn load_resets_template_state() {
        let mut template = two_step();
        template.phases[0].tasks[0].checks[0].state = CheckState::Completed;
        template.phases[0].tasks[0].checks[0].notes.push("stale".into());
        let instance = ChecklistEngine::default().load(&template).unwrap();
        let name = instance.check("name").unwrap();
        assert_eq!(name.state, CheckState::InProgress);
        assert!(name.notes.is_empty());
    }

    #[test]
    fn load_rejects_malformed_templates() {
        let engine = ChecklistEngine::default();

        let dup = checklist(vec![task(
            "t",
            &[],
            vec![check("a", &["age"], "p"), check("a", &["age"], "p")],
        )]);
        assert!(matches!(engine.load(&dup), Err(ChecklistError::DuplicateCheckId(_))));

        let unknown_dep = checklist(vec![task("t", &["ghost"], vec![])]);
        assert!(matches!(
            engine.load(&unknown_dep),
            Err(ChecklistError::UnknownDependency { .. })
        ));

        let cycle = checklist(vec![task("a", &["b"], vec![]), task("b", &["a"], vec![])]);
        assert!(matches!(engine.load(&cycle), Err(ChecklistError::DependencyCycle(_))));

        let bad_path = checklist(vec![task("t", &[], vec![check("a", &["age"], "p..x")])]);
        assert!(matches!(
            engine.load(&bad_path),
            Err(ChecklistError::InvalidContextPath { .. })
        ));

        let unknown_field = checklist(vec![task("t", &[], vec![check("a", &["shoe_size"], "p")])]);
        assert!(matches!(
            engine.load(&unknown_field),
            Err(ChecklistError::UnknownField { .. })
        ));
    }

    #[test]
    fn empty_checklist_is_legal() {
        let instance = ChecklistEngine::default().load(&checklist(vec![])).unwrap();
        assert!(instance.find_current_check().is_none());
        assert!(instance.is_finished());
        assert_eq!(instance.progress(), 0.0);
    }

    #[test]
    fn complete_writes_facts_and_provenance() {
        let engine = ChecklistEngine::default();
        let mut instance = engine.load(&two_step()).unwrap();
        let mut facts = Facts::default();

        let extracted = engine.extract("Mi chiamo Francesco", &["first_name".to_string()]);
        assert!(ChecklistEngine::is_complete(instance.check("name").unwrap(), &extracted));
        instance.complete("name", &extracted, &mut facts).unwrap();

        let name = instance.check("name").unwrap();
        assert_eq!(name.state, CheckState::Completed);
        assert!(name.timestamp.is_some());
        assert!(name.notes[0].contains("first_name"));
        assert_eq!(facts.get_field("profile", "first_name"), Some(&json!("Francesco")));
        assert_eq!(instance.progress(), 50.0);
    }

    #[test]
    fn complete_requires_focus() {
        let mut instance = ChecklistEngine::default().load(&two_step()).unwrap();
        let mut facts = Facts::default();
        let err = instance
            .complete("age", &data(&[("age", json!(30))]), &mut facts)
            .unwrap_err();
        assert!(matches!(
            err,
            ChecklistError::InvalidTransition { from: CheckState::Pending, .. }
        ));
        assert_eq!(facts, Facts::default());

        let err = instance
            .complete("missing", &ExtractedData::new(), &mut facts)
            .unwrap_err();
        assert!(matches!(err, ChecklistError::UnknownCheck { .. }));
    }

    #[test]
    fn path_conflict_leaves_check_in_progress() {
        let template = checklist(vec![task(
            "t",
            &[],
            vec![check("a", &["age"], "profile.age.detail")],
        )]);
        let mut instance = ChecklistEngine::default().load(&template).unwrap();
        let mut facts = Facts::default();
        facts
            .set_fields("profile", &data(&[("age", json!(30))]))
            .unwrap();
        let before = facts.clone();

        let err = instance
            .complete("a", &data(&[("age", json!(31))]), &mut facts)
            .unwrap_err();
        assert!(matches!(err, ChecklistError::PathConflict(_)));
        assert_eq!(instance.check("a").unwrap().state, CheckState::InProgress);
        assert_eq!(facts, before);
    }

    #[test]
    fn advance_keeps_single_focus() {
        let template = checklist(vec![task(
            "t",
            &[],
            vec![check("a", &["age"], "p"), check("b", &["weight"], "p")],
        )]);
        let mut instance = ChecklistEngine::default().load(&template).unwrap();
        assert_eq!(instance.advance().unwrap().check_id, "a");
        assert_eq!(instance.advance().unwrap().check_id, "a");
        assert_eq!(in_progress_count(&instance), 1);

        let mut facts = Facts::default();
        instance
            .complete("a", &data(&[("age", json!(30))]), &mut facts)
            .unwrap();
        assert_eq!(in_progress_count(&instance), 0);
        assert_eq!(instance.advance().unwrap().check_id, "b");
        assert_eq!(in_progress_count(&instance), 1);
    }

    #[test]
    fn dependent_task_waits_for_dependencies() {
        let template = checklist(vec![
            task("first", &[], vec![check("a", &["age"], "p"), check("b", &["weight"], "p")]),
            task("second", &["first"], vec![check("c", &["height"], "p")]),
        ]);
        let mut instance = ChecklistEngine::default().load(&template).unwrap();
        let mut facts = Facts::default();

        assert!(instance.upcoming_checks(3).iter().all(|c| c.check_id != "c"));
        instance
            .complete("a", &data(&[("age", json!(30))]), &mut facts)
            .unwrap();
        assert_eq!(instance.advance().unwrap().check_id, "b");
        assert_eq!(instance.check("c").unwrap().state, CheckState::Pending);

        instance
            .complete("b", &data(&[("weight", json!(70.0))]), &mut facts)
            .unwrap();
        assert_eq!(instance.advance().unwrap().check_id, "c");
    }

    #[test]
    fn skipped_unblocks_failed_blocks() {
        let mut skipped = ChecklistEngine::default().load(&two_step()).unwrap();
        skipped.skip_check("name", "user declined").unwrap();
        assert_eq!(skipped.check("name").unwrap().state, CheckState::Skipped);
        assert_eq!(skipped.find_current_check().unwrap().check_id, "age");
        assert_eq!(skipped.check("age").unwrap().state, CheckState::InProgress);
        assert_eq!(skipped.progress(), 0.0);

        let mut failed = ChecklistEngine::default().load(&two_step()).unwrap();
        failed.fail_check("name", "could not extract").unwrap();
        assert!(failed.find_current_check().is_none());
        assert_eq!(failed.check("age").unwrap().state, CheckState::Pending);
        assert!(failed.is_blocked());
        assert!(!skipped.is_blocked());

        let err = failed.skip_check("name", "again").unwrap_err();
        assert!(matches!(err, ChecklistError::InvalidTransition { .. }));
    }

    #[test]
    fn progress_is_monotonic_until_done() {
        let engine = ChecklistEngine::default();
        let mut instance = engine.load(&two_step()).unwrap();
        let mut facts = Facts::default();
        let answers = ["my name is Ada", "I am 31 years old"];
        let mut last = instance.progress();

        for answer in answers {
            let current = instance.find_current_check().unwrap().clone();
            let extracted = engine.extract(answer, &current.required_data);
            assert!(ChecklistEngine::is_complete(&current, &extracted));
            instance.complete(&current.check_id, &extracted, &mut facts).unwrap();
            instance.advance();
            assert!(instance.progress() >= last);
            last = instance.progress();
        }

        assert!(instance.find_current_check().is_none());
        assert_eq!(instance.progress(), 100.0);
        assert_eq!(facts.get_field("profile.body", "age"), Some(&json!(31)));
    }

    #[test]
    fn is_complete_requires_every_field() {
        let c = check("body", &["height", "weight"], "p");
        assert!(!ChecklistEngine::is_complete(&c, &data(&[("height", json!(180))])));
        assert!(ChecklistEngine::is_complete(
            &c,
            &data(&[("height", json!(180)), ("weight", json!(75.0))])
        ));
    }

    #[test]
    fn lookups_by_check_id() {
        let instance = ChecklistEngine::default().load(&two_step()).unwrap();
        assert_eq!(instance.task_of("age").unwrap().task_id, "body");
        assert_eq!(instance.phase_of("age").unwrap().phase_id, "main");
        assert!(instance.task_of("ghost").is_none());
    }
}
