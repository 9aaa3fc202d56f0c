//! The action-selecting oracle.
//!
//! An [`Oracle`] maps a single utterance plus a set of declared tools to at
//! most one chosen action. Every call is stateless: no conversation history is
//! carried between utterances, so each line of transcript is judged on its
//! own. [`OpenAiCompatibleOracle`] is the production implementation and works
//! against any OpenAI-compatible chat-completions endpoint.

use anyhow::{Context, Result, bail};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An action selection produced by the oracle: the registered action's name
/// and its keyword-style arguments. Zero or one of these per utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// The three possible shapes of an oracle response.
#[derive(Debug, Clone)]
pub enum OracleReply {
    /// The oracle selected an action.
    Action(ActionRequest),
    /// The oracle responded with plain text and no action.
    Text(String),
    /// The oracle produced neither an action nor text.
    Empty,
}

/// A stateless capability that chooses at most one action for an utterance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Submits one utterance, judged independently of any prior call.
    async fn decide(
        &self,
        system_prompt: &str,
        utterance: &str,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<OracleReply>;
}

/// An [`Oracle`] backed by an OpenAI-compatible chat-completions API.
///
/// Gemini is reachable through the same implementation via its
/// OpenAI-compatible base URL.
pub struct OpenAiCompatibleOracle {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCompatibleOracle {
    /// Creates a new oracle client.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration, including key and base URL.
    /// * `model` - Model identifier for chat completions (e.g. "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl Oracle for OpenAiCompatibleOracle {
    async fn decide(
        &self,
        system_prompt: &str,
        utterance: &str,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<OracleReply> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.to_string())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(utterance.to_string())
                .build()?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .tools(tools)
            .tool_choice("auto")
            .build()?;

        let response = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .first()
            .context("Oracle response contained no choices")?;

        if let Some(tool_calls) = &choice.message.tool_calls {
            // The contract is at most one action per utterance; if the model
            // returns several, only the first is honored.
            if let Some(call) = tool_calls.first() {
                let arguments = parse_arguments(&call.function.arguments)?;
                return Ok(OracleReply::Action(ActionRequest {
                    name: call.function.name.clone(),
                    arguments,
                }));
            }
        }

        if let Some(content) = &choice.message.content {
            return Ok(OracleReply::Text(content.clone()));
        }

        Ok(OracleReply::Empty)
    }
}

/// Parses the raw tool-call argument string into a keyword map.
///
/// An empty string means "no arguments"; anything else must be a JSON object.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("tool call arguments are not valid JSON: {raw}"))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("tool call arguments must be a JSON object, got: {other}"),
    }
}
