use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::ChannelSink;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll wait passed to getUpdates, kept under the request timeout.
const LONG_POLL_SECS: u64 = 25;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: format!("{}/bot{}", TELEGRAM_API_URL, bot_token),
        }
    }

    /// Send an HTML-formatted message to a chat or channel.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        self.post_message(chat_id, text, Some("HTML")).await
    }

    /// Send a message without any parse mode; used for command replies so
    /// user-supplied feed names and URLs can't break entity parsing.
    pub async fn send_plain(&self, chat_id: &str, text: &str) -> Result<()> {
        self.post_message(chat_id, text, None).await
    }

    async fn post_message(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: false,
        };

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::TelegramApi(format!(
                "sendMessage failed: {}",
                error_text
            )));
        }

        Ok(())
    }

    /// Long-poll for incoming updates starting after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("offset", offset), ("timeout", LONG_POLL_SECS as i64)])
            // The long poll holds the connection open past the client default
            .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::TelegramApi(format!(
                "getUpdates failed: {}",
                error_text
            )));
        }

        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            return Err(AppError::TelegramApi(
                body.description
                    .unwrap_or_else(|| "getUpdates returned ok=false".to_string()),
            ));
        }

        Ok(body.result.unwrap_or_default())
    }
}

#[async_trait]
impl ChannelSink for TelegramClient {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        self.send_message(destination, text).await
    }
}
