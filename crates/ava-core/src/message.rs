//! Chat message and conversation types
//!
//! These are shared between the API client and the widget state and don't
//! depend on any UI framework.

use serde::{Deserialize, Serialize};

/// A single chat line as exchanged with the messaging API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier, absent until the message is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub line_type: LineType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

impl Message {
    /// A new, not yet persisted message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            line_type: LineType::User,
            content: content.into(),
            created_date: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    User,
    System,
}

/// Named partition of a user's conversation, each with its own history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatContext {
    Onboarding,
    Sales,
    Other,
}

impl ChatContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatContext::Onboarding => "Onboarding",
            ChatContext::Sales => "Sales",
            ChatContext::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "onboarding" => Some(ChatContext::Onboarding),
            "sales" => Some(ChatContext::Sales),
            "other" => Some(ChatContext::Other),
            _ => None,
        }
    }

    pub fn all() -> Vec<ChatContext> {
        vec![ChatContext::Onboarding, ChatContext::Sales, ChatContext::Other]
    }

    /// Contexts offered by the widget's selector
    pub fn selectable() -> Vec<ChatContext> {
        vec![ChatContext::Onboarding, ChatContext::Sales]
    }

    /// Next selectable context, wrapping around
    pub fn next(&self) -> ChatContext {
        let options = Self::selectable();
        let i = options.iter().position(|c| c == self).map(|i| i + 1).unwrap_or(0);
        options[i % options.len()]
    }
}

impl Default for ChatContext {
    fn default() -> Self {
        ChatContext::Onboarding
    }
}

impl std::fmt::Display for ChatContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed-in user as reported by the session endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Identifies one message collection on the server: a user's chat in a context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatKey {
    pub user_id: String,
    pub context: ChatContext,
}

impl ChatKey {
    pub fn new(user_id: impl Into<String>, context: ChatContext) -> Self {
        Self {
            user_id: user_id.into(),
            context,
        }
    }

    /// Path of the message collection, relative to the API base URL
    pub fn messages_path(&self) -> String {
        format!(
            "/api/users/{}/chats/{}/messages",
            self.user_id,
            self.context.as_str()
        )
    }

    pub fn message_path(&self, message_id: &str) -> String {
        format!("{}/{}", self.messages_path(), message_id)
    }
}

impl std::fmt::Display for ChatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.context)
    }
}
