//! Text generation for workflow descriptions, requirements and setup guides.
//!
//! [`CompletionProvider`] abstracts the chat-completion backend;
//! [`OpenAIChat`] calls `POST {api_base}/chat/completions`.
//!
//! [`generate`] makes exactly one attempt. If the call fails or returns no
//! text, it logs a warning and returns the [`PromptKind::fallback`] text
//! built from the same inputs, so callers always get prose back.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::{status_error, UpstreamError};

const SERVICE: &str = "OpenAI chat";

/// Nodes that need no credentials and are left out of requirement fallbacks.
const CREDENTIAL_FREE_NODES: [&str; 5] = ["Start", "Manual Trigger", "Webhook", "If", "Set"];

/// Nodes left out of the setup fallback's credential step.
const TRIGGER_NODES: [&str; 3] = ["Start", "Manual Trigger", "Webhook"];

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion provider using the OpenAI chat API.
pub struct OpenAIChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAIChat {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.openai.api_base,
            config.openai_api_key()?,
            config.openai.completion_model.clone(),
            config.openai.temperature,
            Duration::from_secs(config.openai.timeout_secs),
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenAIChat {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await.into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| UpstreamError::decode(SERVICE, "missing choices[0].message.content"))?;

        Ok(content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// The four kinds of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Description,
    Requirements,
    DetailedInfo,
    SetupSteps,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Requirements => "requirements",
            Self::DetailedInfo => "detailed_info",
            Self::SetupSteps => "setup_steps",
        }
    }

    /// Token budget for the completion.
    pub fn max_tokens(&self) -> u32 {
        match self {
            Self::Description => 150,
            Self::Requirements => 300,
            Self::DetailedInfo => 250,
            Self::SetupSteps => 400,
        }
    }

    pub fn prompt(&self, title: &str, nodes: &[String]) -> String {
        let nodes = nodes.join(", ");
        match self {
            Self::Description => format!(
                "Create a concise, user-friendly description (max 100 words) for this n8n workflow:\n\n\
                 Title: {title}\n\
                 Nodes used: {nodes}\n\n\
                 Focus on:\n\
                 - What the workflow does\n\
                 - Main use case or benefit\n\
                 - Who would use it\n\n\
                 Write in a helpful, professional tone."
            ),
            Self::Requirements => format!(
                "Analyze this n8n workflow and list the requirements:\n\n\
                 Title: {title}\n\
                 Nodes: {nodes}\n\n\
                 Provide:\n\
                 1. Required credentials/API keys\n\
                 2. Prerequisites (accounts, services)\n\
                 3. Technical requirements\n\
                 4. Permissions needed\n\n\
                 Format as a clear, bulleted list. Be specific and practical."
            ),
            Self::DetailedInfo => format!(
                "Provide detailed information about this n8n workflow:\n\n\
                 Title: {title}\n\
                 Nodes: {nodes}\n\n\
                 Include:\n\
                 - How it works (workflow logic)\n\
                 - Key benefits\n\
                 - Use cases\n\
                 - Best practices\n\
                 - Limitations or considerations\n\n\
                 Write in a helpful, informative tone. Max 200 words."
            ),
            Self::SetupSteps => format!(
                "Create step-by-step setup instructions for this n8n workflow:\n\n\
                 Title: {title}\n\
                 Nodes: {nodes}\n\n\
                 Provide 4-6 clear, actionable steps that include:\n\
                 - Required credentials/API keys\n\
                 - Node configuration\n\
                 - Testing steps\n\
                 - Common gotchas or tips\n\n\
                 Format as a numbered list. Be specific and helpful."
            ),
        }
    }

    /// Deterministic text used when the completion call fails.
    pub fn fallback(&self, title: &str, nodes: &[String]) -> String {
        match self {
            Self::Description => format!(
                "This workflow uses {} to automate tasks related to {}.",
                first_three(nodes.iter()),
                title
            ),
            Self::Requirements => format!(
                "• API credentials for: {}\n\
                 • Active accounts for required services\n\
                 • n8n instance with appropriate permissions\n\
                 • Network access to external APIs",
                first_three(
                    nodes
                        .iter()
                        .filter(|n| !CREDENTIAL_FREE_NODES.contains(&n.as_str()))
                )
            ),
            Self::DetailedInfo => format!(
                "This workflow automates tasks using {} nodes including {}. \
                 It provides efficient automation for {} related processes. \
                 The workflow can be customized to fit specific business needs \
                 and integrates with various external services.",
                nodes.len(),
                first_three(nodes.iter()),
                title.to_lowercase()
            ),
            Self::SetupSteps => format!(
                "1. Import the workflow into your n8n instance\n\
                 2. Configure credentials for: {}\n\
                 3. Test the workflow with sample data\n\
                 4. Activate the workflow when ready",
                first_three(
                    nodes
                        .iter()
                        .filter(|n| !TRIGGER_NODES.contains(&n.as_str()))
                )
            ),
        }
    }
}

/// Join the first three names with `", "`.
pub fn first_three<'a>(nodes: impl Iterator<Item = &'a String>) -> String {
    nodes.take(3).map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Generate text of the given kind, falling back to the template on failure.
pub async fn generate(
    provider: &dyn CompletionProvider,
    kind: PromptKind,
    title: &str,
    nodes: &[String],
) -> String {
    let prompt = kind.prompt(title, nodes);
    match provider.complete(&prompt, kind.max_tokens()).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            tracing::warn!(kind = kind.as_str(), title, "empty completion, using fallback");
            kind.fallback(title, nodes)
        }
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), title, error = %e, "completion failed, using fallback");
            kind.fallback(title, nodes)
        }
    }
}
