//! Client for the remote chat-completions gateway.
//!
//! Two request kinds share one endpoint: a "reasoning approach" call that
//! asks the model to propose two complementary reasoning frameworks plus a
//! hybrid prompt prefix, and the ordinary chat call. Message assembly and
//! response splitting are plain functions so they can be tested without a
//! network.

use crate::api::{ChatMessage, ChatRequest, ChatResponse, ContentPart, ImageUrl, MessageContent};
use crate::core::conversation::{Message, PendingTurn, Role};
use crate::utils::url::construct_api_url;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Literal heading the reasoning template asks the model to emit. Splitting
/// on it is a best-effort heuristic: a model that rephrases the heading
/// yields an explanation with no hybrid prompt, which callers must accept.
pub const HYBRID_PROMPT_MARKER: &str = "Hybrid prompt prefix to add:";

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Errors from talking to the gateway. These never cross the presentation
/// boundary as errors; the edge renders them with
/// [`GatewayError::user_message`] and shows the text inline.
#[derive(Debug)]
pub enum GatewayError {
    /// No credential is configured; detected before any network I/O.
    MissingCredential,
    /// Transport-level failure (connection, TLS, request build).
    Request(reqwest::Error),
    /// The gateway answered with a non-success status.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response body did not contain `choices[0].message.content`.
    MalformedResponse,
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::MissingCredential => write!(f, "API key is required"),
            GatewayError::Request(source) => write!(f, "Request to gateway failed: {source}"),
            GatewayError::Status { status, body } => {
                write!(f, "API request failed with status {status}: {body}")
            }
            GatewayError::MalformedResponse => {
                write!(f, "Gateway response did not contain a reply")
            }
        }
    }
}

impl StdError for GatewayError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GatewayError::Request(source) => Some(source),
            _ => None,
        }
    }
}

impl GatewayError {
    /// The inline text shown in place of a reply or explanation.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::MissingCredential => {
                "API key is required. Set one with `tandem set-key`.".to_string()
            }
            GatewayError::MalformedResponse => "No response from the model.".to_string(),
            other => format!("Error: {other}"),
        }
    }
}

/// The outcome of a reasoning-approach call: the full explanation text and,
/// when the marker was found, the extracted hybrid prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningApproach {
    pub explanation: String,
    pub hybrid_prompt: Option<String>,
}

pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Ask the model which two reasoning frameworks suit `query`, returning
    /// the explanation and the extracted hybrid prompt if the response
    /// contains the expected heading.
    pub async fn request_reasoning_approach(
        &self,
        api_key: &str,
        model: &str,
        query: &str,
    ) -> Result<ReasoningApproach, GatewayError> {
        if api_key.is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::text("user", reasoning_prompt(query))],
        };
        let text = self.post_chat(api_key, &request).await?;
        Ok(split_reasoning_response(&text))
    }

    /// Send the conversation and return the assistant's reply.
    ///
    /// `turn` holds the one-shot hybrid prompt and image for this exchange;
    /// both apply only to the trailing message and only when that message is
    /// user-authored.
    pub async fn send_chat(
        &self,
        api_key: &str,
        model: &str,
        history: &[Message],
        turn: &PendingTurn,
    ) -> Result<String, GatewayError> {
        if api_key.is_empty() {
            return Err(GatewayError::MissingCredential);
        }
        let request = ChatRequest {
            model: model.to_string(),
            messages: build_outgoing_messages(history, turn),
        };
        self.post_chat(api_key, &request).await
    }

    async fn post_chat(&self, api_key: &str, request: &ChatRequest) -> Result<String, GatewayError> {
        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        debug!(model = %request.model, "posting chat completion");
        let response = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(request)
            .send()
            .await
            .map_err(GatewayError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Status { status, body });
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|_| GatewayError::MalformedResponse)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::MalformedResponse)
    }
}

/// Split a reasoning-approach response on the hybrid-prompt heading.
///
/// The full text is always kept as the explanation. An empty tail after the
/// marker counts as no hybrid prompt.
pub fn split_reasoning_response(text: &str) -> ReasoningApproach {
    let hybrid_prompt = text
        .split_once(HYBRID_PROMPT_MARKER)
        .map(|(_, tail)| tail.trim().to_string())
        .filter(|tail| !tail.is_empty());
    ReasoningApproach {
        explanation: text.to_string(),
        hybrid_prompt,
    }
}

/// Assemble the outgoing message list for a chat call.
///
/// A fresh system message leads the list; it is never part of the stored
/// transcript. History passes through with role and content intact, except
/// the trailing message when it is user-authored: a hybrid prompt rewrites
/// its text, and an image turns its content into text + image parts.
pub fn build_outgoing_messages(history: &[Message], turn: &PendingTurn) -> Vec<ChatMessage> {
    let mut outgoing = Vec::with_capacity(history.len() + 1);
    outgoing.push(ChatMessage::text("system", SYSTEM_PROMPT));

    let last_index = history.len().checked_sub(1);
    for (index, message) in history.iter().enumerate() {
        let is_pending_user_turn = Some(index) == last_index && message.role == Role::User;
        if !is_pending_user_turn {
            outgoing.push(ChatMessage::text(message.role.as_str(), message.content.clone()));
            continue;
        }

        let text = match &turn.hybrid_prompt {
            Some(hybrid) => format!("{hybrid}\n\nUser query: {}", message.content),
            None => message.content.clone(),
        };
        let content = match &turn.image {
            Some(bytes) => MessageContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_uri(bytes),
                    },
                },
            ]),
            None => MessageContent::Text(text),
        };
        outgoing.push(ChatMessage {
            role: message.role.as_str().to_string(),
            content,
        });
    }
    outgoing
}

pub fn image_data_uri(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(bytes))
}

fn reasoning_prompt(query: &str) -> String {
    format!(
        "I have a question/task: \"{query}\"\n\
         \n\
         From ALL POSSIBLE reasoning frameworks (including but not limited to: inductive, \
         deductive, abductive, critical thinking, systems thinking, lateral thinking, \
         dialectical reasoning, analogical reasoning, counterfactual reasoning, first \
         principles reasoning, systems 1/2/3 thinking, bayesian reasoning, causal reasoning, \
         etc.), identify TWO complementary reasoning approaches that would work well IN TANDEM \
         to address this question/task effectively.\n\
         \n\
         Explain briefly why these two specific frameworks combined would yield the best \
         results for this particular query. Be specific about how they complement each other.\n\
         \n\
         FORMAT YOUR RESPONSE AS:\n\
         1. Framework 1: [name] - [brief justification]\n\
         2. Framework 2: [name] - [brief justification]\n\
         3. Why combining them works: [explanation]\n\
         4. {HYBRID_PROMPT_MARKER} [A paragraph that instructs how to use these two frameworks together]"
    )
}
