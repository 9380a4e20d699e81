//! Checklist template sources.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChecklistError;

use super::model::Checklist;

/// The fixed set of checklist kinds a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistType {
    #[default]
    Onboarding,
    DailyCheckin,
    Reconnection,
}

impl ChecklistType {
    pub const ALL: [ChecklistType; 3] = [
        ChecklistType::Onboarding,
        ChecklistType::DailyCheckin,
        ChecklistType::Reconnection,
    ];

    /// Lenient parse; `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "onboarding" => Some(Self::Onboarding),
            "daily_checkin" | "daily" | "checkin" => Some(Self::DailyCheckin),
            "reconnection" | "reconnect" => Some(Self::Reconnection),
            _ => None,
        }
    }

    /// Parse, falling back to the default type on an unknown name.
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!(requested = name, "Unknown checklist type, using default");
            Self::default()
        })
    }
}

impl_label!(ChecklistType {
    Onboarding => "onboarding",
    DailyCheckin => "daily_checkin",
    Reconnection => "reconnection",
});

/// Read-only source of checklist templates.
pub trait TemplateSource: Send + Sync {
    fn load_template(&self, checklist_type: ChecklistType) -> Result<Checklist, ChecklistError>;
}

/// Templates compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    fn raw(checklist_type: ChecklistType) -> &'static str {
        match checklist_type {
            ChecklistType::Onboarding => include_str!("../../templates/onboarding.json"),
            ChecklistType::DailyCheckin => include_str!("../../templates/daily_checkin.json"),
            ChecklistType::Reconnection => include_str!("../../templates/reconnection.json"),
        }
    }
}

impl TemplateSource for BuiltinTemplates {
    fn load_template(&self, checklist_type: ChecklistType) -> Result<Checklist, ChecklistError> {
        parse_template(checklist_type.as_str(), Self::raw(checklist_type))
    }
}

/// Templates read from `<dir>/<type>.json`, with the built-in template used
/// when a file is missing.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    dir: PathBuf,
    fallback: BuiltinTemplates,
}

impl DirectoryTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fallback: BuiltinTemplates,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, checklist_type: ChecklistType) -> PathBuf {
        self.dir.join(format!("{checklist_type}.json"))
    }
}

impl TemplateSource for DirectoryTemplates {
    fn load_template(&self, checklist_type: ChecklistType) -> Result<Checklist, ChecklistError> {
        let path = self.path_for(checklist_type);
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), "Loading checklist template");
                parse_template(&path.display().to_string(), &raw)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Checklist template not found, using built-in"
                );
                self.fallback.load_template(checklist_type)
            }
        }
    }
}

fn parse_template(name: &str, raw: &str) -> Result<Checklist, ChecklistError> {
    serde_json::from_str(raw).map_err(|e| ChecklistError::TemplateParse {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
