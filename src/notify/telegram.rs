use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::MessageDelivery;

const API_BASE: &str = "https://api.telegram.org";
/// Telegram limit for photo captions.
const CAPTION_MAX_CHARS: usize = 1024;

#[derive(Clone)]
pub struct TelegramDelivery {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
    timeout: Duration,
}

impl TelegramDelivery {
    pub fn new(client: Client, bot_token: String, chat_id: String) -> Self {
        Self {
            client,
            bot_token,
            chat_id,
            api_base: API_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn call<T: Serialize + ?Sized>(&self, method: &str, payload: &T) -> Result<()> {
        let url = format!("{}/bot{}/{}", self.api_base, self.bot_token, method);
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            // The URL carries the bot token.
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;
        let body: TelegramResponse = rsp
            .json()
            .await
            .map_err(|e| anyhow!("telegram response unreadable: {}", e.without_url()))?;
        if body.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "telegram error: {}",
                body.description.unwrap_or_else(|| "unknown".to_string())
            ))
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait::async_trait]
impl MessageDelivery for TelegramDelivery {
    async fn deliver(&self, text: &str, image_url: Option<&str>) -> bool {
        let photo = image_url
            .map(str::trim)
            .filter(|u| !u.is_empty() && text.chars().count() <= CAPTION_MAX_CHARS);

        let res = match photo {
            Some(photo) => {
                self.call(
                    "sendPhoto",
                    &SendPhoto {
                        chat_id: &self.chat_id,
                        photo,
                        caption: text,
                        parse_mode: "HTML",
                    },
                )
                .await
            }
            None => {
                self.call(
                    "sendMessage",
                    &SendMessage {
                        chat_id: &self.chat_id,
                        text,
                        parse_mode: "HTML",
                        disable_web_page_preview: false,
                    },
                )
                .await
            }
        };

        match res {
            Ok(()) => {
                info!(with_photo = photo.is_some(), "telegram message sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "telegram delivery failed");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
