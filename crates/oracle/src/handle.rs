//! Cloneable oracle handle wrapping [`ChatClient`].

use std::sync::Arc;

use crate::client::ChatClient;
use crate::prompt::{PromptContext, PromptSet};

/// Cloneable handle for oracle calls.
///
/// Wraps an `Arc<ChatClient>` so it can be cheaply cloned and shared
/// read-only across concurrent attempts.
#[derive(Clone)]
pub struct OracleHandle(Arc<ChatClient>);

impl OracleHandle {
    pub fn new(client: ChatClient) -> Self {
        Self(Arc::new(client))
    }

    /// Prompt templates the client was configured with.
    pub fn prompts(&self) -> &PromptSet {
        &self.0.config().prompts
    }

    /// Sample one thought proposal.
    pub async fn propose(&self, context: &PromptContext) -> anyhow::Result<String> {
        self.0.propose(context).await
    }

    /// Sample one critique.
    pub async fn critique(&self, context: &PromptContext) -> anyhow::Result<String> {
        self.0.critique(context).await
    }
}
