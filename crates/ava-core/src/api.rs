use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{cookie::Jar, Client, Response, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::message::{ChatKey, Message, User};

/// Name of the cookie carrying the server-side session
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

/// The create endpoint answers with the stored message and any reply
#[derive(Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Batch { messages: Vec<Message> },
    Single(Message),
}

#[derive(Deserialize)]
struct SessionResponse {
    #[serde(default)]
    user: Option<User>,
}

/// Message collection operations for one user's chats
#[async_trait]
pub trait MessageApi: Send + Sync {
    async fn list_messages(&self, key: &ChatKey) -> Result<Vec<Message>, ApiError>;

    /// Returns the messages the server stored or generated for this send
    async fn create_message(
        &self,
        key: &ChatKey,
        message: &Message,
    ) -> Result<Vec<Message>, ApiError>;

    async fn update_message(
        &self,
        key: &ChatKey,
        id: &str,
        message: &Message,
    ) -> Result<(), ApiError>;

    async fn delete_message(&self, key: &ChatKey, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    /// The signed-in user, or `None` when the session is anonymous
    async fn current_user(&self) -> Result<Option<User>, ApiError>;
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct ChatApiClient {
    client: Client,
    base_url: String,
}

impl ChatApiClient {
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let jar = Jar::default();
        if let Some(cookie) = session_cookie {
            jar.add_cookie_str(&format!("{}={}", SESSION_COOKIE, cookie), &parsed);
        }

        let client = Client::builder()
            .cookie_provider(Arc::new(jar))
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(response: Response, url: &str) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            })
        }
    }
}

#[async_trait]
impl MessageApi for ChatApiClient {
    async fn list_messages(&self, key: &ChatKey) -> Result<Vec<Message>, ApiError> {
        let url = self.url(&key.messages_path());
        let response = self.client.get(&url).send().await?;

        // Anything but 200 keeps the caller's current list
        if response.status() != StatusCode::OK {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body: MessagesResponse = response.json().await?;
        log::debug!("[api] listed {} messages for {}", body.messages.len(), key);
        Ok(body.messages)
    }

    async fn create_message(
        &self,
        key: &ChatKey,
        message: &Message,
    ) -> Result<Vec<Message>, ApiError> {
        let url = self.url(&key.messages_path());
        let response = self.client.post(&url).json(message).send().await?;
        let response = Self::check_status(response, &url)?;

        let created = match response.json::<CreateResponse>().await? {
            CreateResponse::Batch { messages } => messages,
            CreateResponse::Single(message) => vec![message],
        };
        Ok(created)
    }

    async fn update_message(
        &self,
        key: &ChatKey,
        id: &str,
        message: &Message,
    ) -> Result<(), ApiError> {
        let url = self.url(&key.message_path(id));
        let response = self.client.put(&url).json(message).send().await?;
        Self::check_status(response, &url)?;
        Ok(())
    }

    async fn delete_message(&self, key: &ChatKey, id: &str) -> Result<(), ApiError> {
        let url = self.url(&key.message_path(id));
        let response = self.client.delete(&url).send().await?;
        Self::check_status(response, &url)?;
        Ok(())
    }
}

#[async_trait]
impl SessionApi for ChatApiClient {
    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let url = self.url("/api/session");
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response, &url)?;
        let body: SessionResponse = response.json().await?;
        Ok(body.user)
    }
}
