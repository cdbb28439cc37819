//! Bridges between search traits and real crate types (oracle).

use std::sync::Arc;

use async_trait::async_trait;
use oracle::{OracleHandle, PromptContext};

use crate::engine::{Oracle, SearchError};

// ---------------------------------------------------------------------------
// Oracle for OracleHandle
// ---------------------------------------------------------------------------

#[async_trait]
impl Oracle for OracleHandle {
    async fn propose(&self, context: &PromptContext) -> Result<String, SearchError> {
        OracleHandle::propose(self, context)
            .await
            .map_err(SearchError::Oracle)
    }

    async fn critique(&self, context: &PromptContext) -> Result<String, SearchError> {
        OracleHandle::critique(self, context)
            .await
            .map_err(SearchError::Oracle)
    }
}

// ---------------------------------------------------------------------------
// Oracle for Arc<T>
// ---------------------------------------------------------------------------

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn propose(&self, context: &PromptContext) -> Result<String, SearchError> {
        (**self).propose(context).await
    }

    async fn critique(&self, context: &PromptContext) -> Result<String, SearchError> {
        (**self).critique(context).await
    }
}
