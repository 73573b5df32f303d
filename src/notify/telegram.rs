use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Notifier;

const API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramNotifier {
    client: Client,
    send_message_url: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_notification: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let send_message_url = format!("{API_URL}/bot{token}/sendMessage");
        Ok(TelegramNotifier {
            client,
            send_message_url,
            chat_id,
        })
    }
}

// keeps the bot token out of logs
impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str, silent: bool) -> Result<()> {
        let request = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            disable_notification: silent,
        };

        let body = self
            .client
            .post(&self.send_message_url)
            .json(&request)
            .send()
            .await
            .map_err(|err| Error::Notification(err.to_string()))?
            .text()
            .await?;

        check_response(&body)
    }
}

fn check_response(body: &str) -> Result<()> {
    let response: ApiResponse = serde_json::from_str(body)?;
    if response.ok {
        Ok(())
    } else {
        let description = response
            .description
            .unwrap_or_else(|| "no description".to_owned());
        Err(Error::Notification(description))
    }
}
