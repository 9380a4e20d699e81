//! Error types for Coach Assist.

use crate::checklist::CheckState;

/// Top-level error type for the coach.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checklist error: {0}")]
    Checklist(#[from] ChecklistError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Knowledge retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Checklist template and state errors.
///
/// Any of these surfacing during a turn is treated as an unexpected failure:
/// the orchestrator answers with an apology and leaves the session untouched.
#[derive(Debug, thiserror::Error)]
pub enum ChecklistError {
    #[error("Check {check_id} not found")]
    UnknownCheck { check_id: String },

    #[error("Check {check_id} cannot transition from {from} to {to}")]
    InvalidTransition {
        check_id: String,
        from: CheckState,
        to: CheckState,
    },

    #[error("Duplicate check id: {0}")]
    DuplicateCheckId(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Task {task_id} depends on unknown task {depends_on}")]
    UnknownDependency { task_id: String, depends_on: String },

    #[error("Dependency cycle involving task {0}")]
    DependencyCycle(String),

    #[error("Check {check_id} requires field {field} which has no extractor")]
    UnknownField { check_id: String, field: String },

    #[error("Invalid context path '{path}' on check {check_id}")]
    InvalidContextPath { check_id: String, path: String },

    #[error("Context path conflict at '{0}': an existing value is not a mapping")]
    PathConflict(String),

    #[error("No checklist loaded for this session")]
    NotLoaded,

    #[error("Failed to parse checklist template {name}: {reason}")]
    TemplateParse { name: String, reason: String },
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Text-generation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Knowledge retrieval backend errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for the coach.
pub type Result<T> = std::result::Result<T, Error>;
