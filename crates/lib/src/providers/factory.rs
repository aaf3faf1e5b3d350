//! # AI Provider Factory
//!
//! Turns a named `ProviderConfig` into a boxed `AiProvider`. The server calls
//! this once at startup for the provider its query-generation task names.

use crate::{
    errors::QueryError,
    providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
    types::ProviderConfig,
};
use tracing::info;

/// Creates an AI provider instance from its configuration entry.
///
/// - `gemini` requires an `api_key`; the URL is derived from `model_name` when absent.
/// - `local` requires an `api_url` pointing at an OpenAI-compatible chat endpoint.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Box<dyn AiProvider>, QueryError> {
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    QueryError::MissingAiProvider(format!(
                        "api_key is required for gemini provider '{name}'"
                    ))
                })?;
            let api_url = config
                .api_url
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| GeminiProvider::endpoint_for_model(&config.model_name));
            info!(provider = %name, %api_url, "Configuring Gemini provider.");
            Box::new(GeminiProvider::new(api_url, api_key)?)
        }
        "local" => {
            let api_url = config
                .api_url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    QueryError::MissingAiProvider(format!(
                        "api_url is required for local provider '{name}'. Please set LOCAL_AI_API_URL in your .env file."
                    ))
                })?;
            info!(provider = %name, %api_url, "Configuring local AI provider.");
            Box::new(LocalAiProvider::new(
                api_url,
                config.api_key.clone().filter(|k| !k.is_empty()),
                Some(config.model_name.clone()),
            )?)
        }
        other => {
            return Err(QueryError::MissingAiProvider(format!(
                "Unsupported AI provider type '{other}' for provider '{name}'"
            )));
        }
    };

    Ok(provider)
}
