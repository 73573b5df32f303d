mod telegram;

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use log::{info, warn};

use crate::error::Result;

pub use telegram::TelegramNotifier;

pub type BoxedNotifier = Box<dyn Notifier + Sync + Send + 'static>;

/// An outbound message channel. `silent` messages are delivered without
/// alerting the reader.
#[async_trait]
pub trait Notifier: Debug {
    async fn notify(&self, message: &str, silent: bool) -> Result<()>;
}

/// Writes messages to the log, for when no message channel is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str, _silent: bool) -> Result<()> {
        info!("{message}");
        Ok(())
    }
}

/// Best-effort front end for a [`Notifier`]: delivery failures are logged and
/// never returned.
#[derive(Debug, Clone)]
pub struct Notifications {
    notifier: Arc<BoxedNotifier>,
}

impl Notifications {
    pub fn new(notifier: BoxedNotifier) -> Self {
        Notifications {
            notifier: Arc::new(notifier),
        }
    }

    pub async fn send(&self, message: &str, silent: bool) {
        if let Err(err) = self.notifier.notify(message, silent).await {
            warn!("{err} (message: {message:?})");
        }
    }

    pub async fn progress(&self, message: &str) {
        self.send(&format!("⏳ {message}"), true).await;
    }

    pub async fn info(&self, message: &str) {
        self.send(&format!("ℹ️ {message}"), true).await;
    }

    pub async fn success(&self, message: &str) {
        self.send(&format!("✅ {message}"), true).await;
    }

    pub async fn error(&self, message: &str) {
        self.send(&format!("❌ {message}"), false).await;
    }
}
