use crate::errors::DeliveryError;
use serde::Serialize;

/// Body of Telegram's `sendMessage` call.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }

    /// Posts `text` as one Markdown message. Not retried.
    pub async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self.client.post(self.send_url()).json(&payload).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Failed to send message: {} {}", status.as_u16(), body);
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Message sent to Telegram successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_matches_send_message_api() {
        let payload = SendMessage {
            chat_id: "-100123",
            text: "*hi*",
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "chat_id": "-100123",
                "text": "*hi*",
                "parse_mode": "Markdown",
                "disable_web_page_preview": true
            })
        );
    }

    #[test]
    fn url_embeds_bot_token() {
        let client = TelegramClient::new(reqwest::Client::new(), "https://api.telegram.org/", "42:abc", "1");
        assert_eq!(client.send_url(), "https://api.telegram.org/bot42:abc/sendMessage");
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let client = TelegramClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "t", "c");
        assert!(matches!(
            client.send_message("report").await,
            Err(DeliveryError::Http(_))
        ));
    }
}
