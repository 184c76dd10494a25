//! Client for the chatbot endpoint under test.
//!
//! Each question is POSTed as `{"question": ..., "test": true}` with the
//! configured `Referer` and `User-Agent` headers. The reply must be JSON
//! with an answer and, optionally, a conversation id.

use crate::config::RemoteQaConfig;
use crate::error::{QcError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Request body sent to the chatbot.
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    test: bool,
}

/// Decoded chatbot reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteReply {
    #[serde(alias = "response")]
    pub answer: String,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
}

/// The chatbot's answer to one question variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAnswer {
    /// 1-indexed variant this answers.
    pub variant_index: usize,
    /// Text that was sent.
    pub question: String,
    /// Answer text; empty when errored.
    pub answer_text: String,
    pub conversation_id: Option<String>,
    pub errored: bool,
    pub error_detail: Option<String>,
}

impl RemoteAnswer {
    /// Fold a call outcome into a record; failures become errored answers.
    pub fn from_outcome(variant_index: usize, question: &str, outcome: Result<RemoteReply>) -> Self {
        match outcome {
            Ok(reply) => Self {
                variant_index,
                question: question.to_string(),
                answer_text: reply.answer,
                conversation_id: reply.conversation_id,
                errored: false,
                error_detail: None,
            },
            Err(e) => Self {
                variant_index,
                question: question.to_string(),
                answer_text: String::new(),
                conversation_id: None,
                errored: true,
                error_detail: Some(e.to_string()),
            },
        }
    }
}

/// The question-answering endpoint being regression-tested.
#[async_trait]
pub trait RemoteQa: Send + Sync {
    async fn ask(&self, question: &str) -> Result<RemoteReply>;
}

/// HTTP client for the chatbot endpoint.
#[derive(Clone)]
pub struct RemoteQaClient {
    client: Client,
    config: RemoteQaConfig,
}

impl RemoteQaClient {
    pub fn new(config: RemoteQaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn decode(status: reqwest::StatusCode, body: &str) -> Result<RemoteReply> {
        if !status.is_success() {
            let preview: String = body.chars().take(200).collect();
            return Err(QcError::RemoteQa(format!(
                "Request failed ({}): {}",
                status, preview
            )));
        }

        serde_json::from_str(body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            QcError::RemoteQa(format!("Response is not a valid answer: {} ({})", e, preview))
        })
    }
}

#[async_trait]
impl RemoteQa for RemoteQaClient {
    async fn ask(&self, question: &str) -> Result<RemoteReply> {
        let response = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .header("Referer", &self.config.referer)
            .header("User-Agent", &self.config.user_agent)
            .json(&AskRequest {
                question,
                test: true,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Self::decode(status, &body)
    }
}
