//! Optional knowledge retrieval used to enrich replies.
//!
//! Retrieval never gates checklist progress: the session service attaches
//! snippets when a retriever answers and carries on without them otherwise.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Up to `limit` snippets relevant to `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>, RetrievalError>;
}

/// Configuration for the HTTP retriever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeConfig {
    pub endpoint: String,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<KnowledgeSnippet>,
}

/// Posts `{query, limit}` and reads `{results: [...]}`.
pub struct HttpKnowledgeRetriever {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpKnowledgeRetriever {
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl KnowledgeRetriever for HttpKnowledgeRetriever {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeSnippet>, RetrievalError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest { query, limit })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::RequestFailed(format!(
                "{status} from {}",
                self.endpoint
            )));
        }
        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;
        Ok(rank(parsed.results, limit))
    }
}

/// Best-scored first, at most `limit`.
pub fn rank(mut snippets: Vec<KnowledgeSnippet>, limit: usize) -> Vec<KnowledgeSnippet> {
    snippets.sort_by(|a, b| b.score.total_cmp(&a.score));
    snippets.truncate(limit);
    snippets
}
