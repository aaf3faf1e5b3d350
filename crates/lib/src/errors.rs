use thiserror::Error;

/// Custom error types for the query pipeline.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("The question must not be empty.")]
    EmptyQuestion,
    #[error("Unsafe query rejected: {0}")]
    UnsafeQuery(String),
    #[error("Query generation failed: {0}")]
    Generation(String),
    #[error("Query generation timed out after {0}s")]
    GenerationTimeout(u64),
    #[error("Query execution failed: {0}")]
    Execution(String),
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is missing: {0}")]
    MissingAiProvider(String),
    #[error("Storage provider is missing")]
    MissingStorageProvider,
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl QueryError {
    /// True for every failure of the generation capability (transport, API, empty output).
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            QueryError::Generation(_)
                | QueryError::GenerationTimeout(_)
                | QueryError::AiRequest(_)
                | QueryError::AiDeserialization(_)
                | QueryError::AiApi(_)
        )
    }
}
