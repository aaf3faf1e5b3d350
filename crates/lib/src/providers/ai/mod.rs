pub mod gemini;
pub mod local;

use crate::errors::QueryError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with an AI provider.
///
/// This is the query-generation capability: given the schema context as the
/// system prompt and the user's question as the user prompt, it returns text
/// that is expected (but never trusted) to be a single SQL statement.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, QueryError>;
}

dyn_clone::clone_trait_object!(AiProvider);
