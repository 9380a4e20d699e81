//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::checklist::ChecklistType;
use crate::error::ConfigError;
use crate::knowledge::KnowledgeConfig;
use crate::llm::LlmConfig;
use crate::orchestrator::OrchestratorLimits;

/// Coach configuration.
#[derive(Debug, Clone)]
pub struct CoachConfig {
    /// Checklist used when a session does not ask for one.
    pub default_checklist: ChecklistType,
    /// Directory of `<type>.json` templates; built-ins when unset.
    pub template_dir: Option<PathBuf>,
    /// libSQL database file; sessions stay in memory when unset.
    pub db_path: Option<PathBuf>,
    /// Port for the HTTP API; no server when unset.
    pub http_port: Option<u16>,
    /// User turns considered for style analysis.
    pub history_window: usize,
    /// Turns kept per session.
    pub max_history: usize,
    pub llm: Option<LlmConfig>,
    pub knowledge: Option<KnowledgeConfig>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        let limits = OrchestratorLimits::default();
        Self {
            default_checklist: ChecklistType::Onboarding,
            template_dir: None,
            db_path: None,
            http_port: None,
            history_window: limits.history_window,
            max_history: limits.max_history,
            llm: None,
            knowledge: None,
        }
    }
}

const DEFAULT_LLM_MODEL: &str = "coach-default";
const DEFAULT_KNOWLEDGE_LIMIT: usize = 3;

impl CoachConfig {
    /// Read configuration from `COACH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let default_checklist = get("COACH_DEFAULT_CHECKLIST")
            .map(|name| ChecklistType::parse_or_default(&name))
            .unwrap_or(defaults.default_checklist);

        let llm = match get("COACH_LLM_ENDPOINT") {
            Some(endpoint) => {
                let model = get("COACH_LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
                let mut config = LlmConfig::new(endpoint, model);
                config.api_key = get("COACH_LLM_API_KEY").map(SecretString::from);
                Some(config)
            }
            None => None,
        };

        let knowledge = match get("COACH_KNOWLEDGE_ENDPOINT") {
            Some(endpoint) => Some(KnowledgeConfig {
                endpoint,
                limit: parse_var(&get, "COACH_KNOWLEDGE_LIMIT")?.unwrap_or(DEFAULT_KNOWLEDGE_LIMIT),
            }),
            None => None,
        };

        let history_window =
            parse_var(&get, "COACH_HISTORY_WINDOW")?.unwrap_or(defaults.history_window);
        if history_window == 0 {
            return Err(ConfigError::InvalidValue {
                key: "COACH_HISTORY_WINDOW".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            default_checklist,
            template_dir: get("COACH_TEMPLATE_DIR").map(PathBuf::from),
            db_path: get("COACH_DB_PATH").map(PathBuf::from),
            http_port: parse_var(&get, "COACH_HTTP_PORT")?,
            history_window,
            max_history: parse_var(&get, "COACH_MAX_HISTORY")?.unwrap_or(defaults.max_history),
            llm,
            knowledge,
        })
    }

    pub fn limits(&self) -> OrchestratorLimits {
        OrchestratorLimits {
            history_window: self.history_window,
            max_history: self.max_history.max(self.history_window),
        }
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
