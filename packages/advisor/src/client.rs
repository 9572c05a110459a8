//! Anthropic Messages API client
//!
//! `AssignmentAdvisor` is the trait the core services program against;
//! `AnthropicAdvisor` is the production implementation over reqwest.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::proposal::{
    build_assignment_prompt, build_tech_stack_prompt, parse_assignment_proposal, parse_tech_stack,
    AssignmentContext, AssignmentProposal, TechStackContext, TechStackSuggestion,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Seam between the core services and the text-generation collaborator
#[async_trait]
pub trait AssignmentAdvisor: Send + Sync {
    async fn propose_assignments(
        &self,
        context: &AssignmentContext,
    ) -> Result<AssignmentProposal, AdvisorError>;

    async fn suggest_tech_stack(
        &self,
        context: &TechStackContext,
    ) -> Result<TechStackSuggestion, AdvisorError>;
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Production advisor backed by the Anthropic Messages API
pub struct AnthropicAdvisor {
    config: AdvisorConfig,
    client: reqwest::Client,
}

impl AnthropicAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Send one user prompt and return the concatenated text blocks
    async fn complete(&self, prompt: &str) -> Result<String, AdvisorError> {
        debug!(chars = prompt.len(), "Sending advisor prompt");

        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Advisor request rejected");
            return Err(AdvisorError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(AdvisorError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl AssignmentAdvisor for AnthropicAdvisor {
    async fn propose_assignments(
        &self,
        context: &AssignmentContext,
    ) -> Result<AssignmentProposal, AdvisorError> {
        let prompt = build_assignment_prompt(context);
        let text = self.complete(&prompt).await?;
        parse_assignment_proposal(&text)
    }

    async fn suggest_tech_stack(
        &self,
        context: &TechStackContext,
    ) -> Result<TechStackSuggestion, AdvisorError> {
        let prompt = build_tech_stack_prompt(context);
        let text = self.complete(&prompt).await?;
        parse_tech_stack(&text)
    }
}
