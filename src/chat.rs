//! SDG expert assistant chat panel.
//!
//! Holds the conversation state and talks to `api/chatbot/*`. Failures never
//! propagate: they become an error banner and, for sends, a synthetic
//! assistant reply so the thread stays coherent.

use crate::api::{ApiClient, CHAT_HISTORY_PATH, CHAT_MESSAGE_PATH, CHAT_SESSION_PATH};
use crate::tracker::ActivityTracker;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Greeting shown when a session has no history.
pub const WELCOME_MESSAGE: &str = "Hello! I am the SDG Expert Assistant. I can help you query SDG (Sustainable Development Goals) related information.

I can:
• Search our SDG keywords, actions, and education databases
• Provide professional SDG advice and guidance
• If there's no relevant information in the database, I'll inform you clearly

Please tell me what SDG-related content you'd like to know about?";

/// Assistant reply substituted when a message could not be sent.
pub const SEND_FAILURE_REPLY: &str =
    "Sorry, I am temporarily unable to process your request. Please try again later.";

pub const INIT_FAILURE_BANNER: &str =
    "Failed to initialize chat session, please refresh the page and try again.";
pub const SEND_FAILURE_BANNER: &str = "Failed to send message, please try again.";

/// Search type reported for chat questions.
const CHAT_SEARCH_TYPE: &str = "chatbot";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        f.write_str(name)
    }
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
            metadata: None,
        }
    }

    pub fn welcome() -> Self {
        Self::new(Role::Assistant, WELCOME_MESSAGE)
    }

    /// Number of database hits the backend reported for this answer.
    pub fn search_results_count(&self) -> Option<u64> {
        self.metadata
            .as_ref()?
            .get("search_results_count")?
            .as_u64()
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.role, self.content)?;
        if let Some(count) = self.search_results_count() {
            write!(f, "\n  (Found {count} results)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Reply from the chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub database_used: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Conversation state of the chat page.
pub struct ChatPanel {
    api: ApiClient,
    tracker: Option<ActivityTracker>,
    messages: Vec<ChatMessage>,
    input: String,
    is_loading: bool,
    session_id: Option<String>,
    error: Option<String>,
    database_used: bool,
}

impl ChatPanel {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            tracker: None,
            messages: Vec::new(),
            input: String::new(),
            is_loading: false,
            session_id: None,
            error: None,
            database_used: false,
        }
    }

    /// Report questions to `tracker` as `chatbot` searches.
    pub fn with_tracker(mut self, tracker: ActivityTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Continue an existing backend session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Error banner text, if one is shown.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the last answer drew on the SDG database.
    pub fn database_used(&self) -> bool {
        self.database_used
    }

    /// Whether the send action is enabled.
    pub fn can_send(&self) -> bool {
        !self.input.trim().is_empty() && !self.is_loading
    }

    /// Open a backend session and load its history.
    pub async fn initialize(&mut self) {
        match self
            .api
            .post_json::<_, SessionResponse>(CHAT_SESSION_PATH, &serde_json::json!({}), false)
            .await
        {
            Ok(SessionResponse {
                session_id: Some(session_id),
            }) => {
                tracing::debug!(%session_id, "Chat session created");
                self.session_id = Some(session_id.clone());
                self.load_history(&session_id).await;
            }
            Ok(SessionResponse { session_id: None }) => {
                tracing::warn!("Chat session response carried no session_id");
            }
            Err(e) => {
                tracing::error!("Failed to initialize chat session: {e}");
                self.error = Some(INIT_FAILURE_BANNER.to_string());
            }
        }
    }

    /// Replace the conversation with the stored history of `session_id`.
    ///
    /// An empty, malformed or unreachable history shows the welcome message.
    pub async fn load_history(&mut self, session_id: &str) {
        let history = self
            .api
            .get_json::<HistoryResponse>(CHAT_HISTORY_PATH, &[("session_id", session_id)], false)
            .await;

        match history {
            Ok(response) if !response.history.is_empty() => {
                self.messages = response.history;
            }
            Ok(_) => {
                self.messages = vec![ChatMessage::welcome()];
            }
            Err(e) => {
                tracing::warn!("Failed to load chat history: {e}");
                self.messages = vec![ChatMessage::welcome()];
            }
        }
    }

    /// Send the current input as a question.
    pub async fn send_message(&mut self) {
        if !self.can_send() {
            return;
        }

        let message = std::mem::take(&mut self.input);
        self.messages.push(ChatMessage::new(Role::User, message.clone()));
        self.is_loading = true;
        self.error = None;

        if let Some(tracker) = &self.tracker {
            tracker.track_search(&message, Some(CHAT_SEARCH_TYPE));
        }

        let session_id = self.session_id.clone().unwrap_or_default();
        let request = ChatRequest {
            message: &message,
            session_id: &session_id,
        };

        match self
            .api
            .post_json::<_, ChatReply>(CHAT_MESSAGE_PATH, &request, false)
            .await
        {
            Ok(reply) => {
                if self.session_id.is_none() {
                    self.session_id = reply.session_id.clone();
                }
                self.messages.push(ChatMessage {
                    metadata: reply.metadata,
                    ..ChatMessage::new(Role::Assistant, reply.response)
                });
                self.database_used = reply.database_used;
            }
            Err(e) => {
                tracing::error!("Failed to send message: {e}");
                self.error = Some(SEND_FAILURE_BANNER.to_string());
                self.messages
                    .push(ChatMessage::new(Role::Assistant, SEND_FAILURE_REPLY));
            }
        }

        self.is_loading = false;
    }

    /// Reset the conversation to the welcome message.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::welcome()];
        self.database_used = false;
        self.error = None;
    }

    /// Reload history for the current session, if any.
    pub async fn reload_history(&mut self) {
        if let Some(session_id) = self.session_id.clone() {
            self.load_history(&session_id).await;
        }
    }
}
