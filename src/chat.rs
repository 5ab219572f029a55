//! Motivation chat: a per-exam conversation with the chat endpoint.
//!
//! The transcript is append-only and lives only as long as the session; the
//! exam choice is persisted through the [`DraftStore`]. Every send produces
//! exactly one assistant message, whether the endpoint replied or not, so the
//! transcript always alternates after the welcome.
//!
//! [`ChatSession::send`] is split for front-ends that redraw while waiting:
//!
//! 1. [`ChatSession::begin_send`] appends the user message, raises the typing flag
//! 2. [`PendingReply::wait`] posts without borrowing the session
//! 3. [`ChatSession::finish`] appends the reply, lowers the flag

use crate::client::{Flow, WebhookClient};
use crate::config::CompanionConfig;
use crate::error::EduGuideError;
use crate::exam::Exam;
use crate::report::lenient;
use crate::storage::DraftStore;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `welcome`, `user-<ms>`, `ai-<ms>` or `error-<ms>`.
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    fn new(id: String, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    fn welcome(exam: Exam) -> Self {
        Self::new("welcome".into(), Role::Assistant, exam.welcome_message())
    }

    /// `true` for the fallback message appended when the endpoint failed.
    pub fn is_error(&self) -> bool {
        self.id.starts_with("error-")
    }
}

const FAILED_REPLY: &str = "Failed to get response. Please try again.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    exam: &'static str,
    chat_input: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default, deserialize_with = "lenient::string")]
    output: String,
}

fn stamped(prefix: &str) -> String {
    format!("{prefix}-{}", Local::now().timestamp_millis())
}

/// A request in flight, detached from its [`ChatSession`].
#[derive(Debug)]
pub struct PendingReply {
    client: WebhookClient,
    url: String,
    timeout: Duration,
    exam: Exam,
    text: String,
}

impl PendingReply {
    /// The trimmed text being sent.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// POST the message and return the endpoint's `output`.
    pub async fn wait(self) -> Result<String, EduGuideError> {
        let body = ChatRequest {
            exam: self.exam.id(),
            chat_input: &self.text,
        };
        let reply = self
            .client
            .post_json::<_, ChatReply>(Flow::Chat, &self.url, &body, self.timeout)
            .await?;
        Ok(reply.output)
    }
}

/// One chat conversation.
#[derive(Debug)]
pub struct ChatSession {
    client: WebhookClient,
    url: String,
    timeout: Duration,
    drafts: DraftStore,
    exam: Exam,
    messages: Vec<ChatMessage>,
    typing: bool,
}

impl ChatSession {
    /// Start a conversation for the last selected exam.
    pub fn new(
        config: &CompanionConfig,
        client: WebhookClient,
        drafts: DraftStore,
    ) -> Result<Self, EduGuideError> {
        let exam = drafts.load_exam()?;
        Ok(Self {
            client,
            url: config.url_for(Flow::Chat).to_string(),
            timeout: config.timeout_for(Flow::Chat),
            drafts,
            exam,
            messages: vec![ChatMessage::welcome(exam)],
            typing: false,
        })
    }

    pub fn exam(&self) -> Exam {
        self.exam
    }

    /// Switch exams and persist the choice. The transcript restarts with the
    /// new exam's welcome.
    pub fn set_exam(&mut self, exam: Exam) -> Result<(), EduGuideError> {
        self.exam = exam;
        self.clear();
        self.drafts.save_exam(exam)
    }

    /// Drop the transcript, keeping only the welcome message.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::welcome(self.exam)];
        self.typing = false;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Set between [`ChatSession::begin_send`] and [`ChatSession::finish`].
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Append `text` as a user message and raise the typing flag.
    ///
    /// Blank input is ignored and returns `None`.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.messages
            .push(ChatMessage::new(stamped("user"), Role::User, text));
        self.typing = true;

        Some(PendingReply {
            client: self.client.clone(),
            url: self.url.clone(),
            timeout: self.timeout,
            exam: self.exam,
            text: text.to_string(),
        })
    }

    /// Append the assistant message for `reply` and lower the typing flag.
    ///
    /// A blank output or an error becomes a fallback message.
    pub fn finish(&mut self, reply: Result<String, EduGuideError>) -> &ChatMessage {
        let message = match reply {
            Ok(output) if !output.trim().is_empty() => {
                debug!("Chat reply: {} chars", output.len());
                ChatMessage::new(stamped("ai"), Role::Assistant, output)
            }
            Ok(_) => {
                warn!("Chat endpoint returned an empty output");
                ChatMessage::new(stamped("error"), Role::Assistant, FAILED_REPLY)
            }
            Err(e) => {
                warn!("Chat request failed: {e}");
                ChatMessage::new(stamped("error"), Role::Assistant, e.user_message())
            }
        };

        self.typing = false;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Send `text` and append the reply.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the trimmed text
    /// is appended as a user message, then exactly one assistant message:
    /// the endpoint's `output`, or a fallback when the request failed.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let pending = self.begin_send(text)?;
        let reply = pending.wait().await;
        Some(self.finish(reply))
    }
}
