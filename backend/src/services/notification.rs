//! Low-stock and shortage notifications
//!
//! The engine hands a batch of notices to a `Notifier` after ledger mutations.
//! Delivery is fire-and-forget: failures are logged by the caller and never
//! change a restock result.
//!
//! Implementations:
//! - `TracingNotifier` writes notices to the log
//! - `LineNotifier` pushes a LINE message to the owner's connected account

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// An item that is at or below its alert threshold after a mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStockNotice {
    pub name: String,
    pub sku: String,
    pub current_quantity: i64,
    pub alert_threshold: i64,
    pub required_level: i64,
}

/// An item whose deficit the warehouse could not fully cover
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortageNotice {
    pub name: String,
    pub sku: String,
    pub needed: i64,
    pub available: i64,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected: {0}")]
    Rejected(String),

    #[error("recipient lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

/// Receives low-stock and shortage batches from the restock engine
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_low_stock(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[LowStockNotice],
    ) -> Result<(), NotifyError>;

    async fn notify_shortage(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[ShortageNotice],
    ) -> Result<(), NotifyError>;
}

/// Format the low-stock message body
pub fn low_stock_message(property_name: &str, items: &[LowStockNotice]) -> String {
    let mut text = format!("Low stock after restocking {}", property_name);
    for item in items {
        text.push_str(&format!(
            "\n- {} ({}): {} left, alert at {}",
            item.name, item.sku, item.current_quantity, item.alert_threshold
        ));
    }
    text
}

/// Format the shortage message body
pub fn shortage_message(property_name: &str, items: &[ShortageNotice]) -> String {
    let mut text = format!("Could not fully restock {}", property_name);
    for item in items {
        text.push_str(&format!(
            "\n- {} ({}): needed {}, sent {}",
            item.name, item.sku, item.needed, item.available
        ));
    }
    text
}

/// Notifier that only logs
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify_low_stock(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[LowStockNotice],
    ) -> Result<(), NotifyError> {
        tracing::info!(
            owner_id = %owner_id,
            property = %property_name,
            count = items.len(),
            "{}",
            low_stock_message(property_name, items)
        );
        Ok(())
    }

    async fn notify_shortage(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[ShortageNotice],
    ) -> Result<(), NotifyError> {
        tracing::info!(
            owner_id = %owner_id,
            property = %property_name,
            count = items.len(),
            "{}",
            shortage_message(property_name, items)
        );
        Ok(())
    }
}

/// LINE Messaging API client
#[derive(Clone)]
pub struct LineMessagingClient {
    channel_access_token: String,
    http_client: reqwest::Client,
}

/// LINE message types
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum LineMessage {
    #[serde(rename = "text")]
    Text { text: String },
}

/// LINE push message request
#[derive(Debug, Serialize)]
struct LinePushRequest {
    to: String,
    messages: Vec<LineMessage>,
}

/// LINE API response
#[derive(Debug, Deserialize)]
struct LineApiResponse {
    #[serde(default)]
    message: Option<String>,
}

impl LineMessagingClient {
    /// Create a new LINE messaging client
    pub fn new(channel_access_token: String, timeout: Duration) -> Result<Self, NotifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            channel_access_token,
            http_client,
        })
    }

    /// Send a push message to a user
    pub async fn send_push_message(
        &self,
        line_user_id: &str,
        message: LineMessage,
    ) -> Result<(), NotifyError> {
        let request = LinePushRequest {
            to: line_user_id.to_string(),
            messages: vec![message],
        };

        let response = self
            .http_client
            .post("https://api.line.me/v2/bot/message/push")
            .bearer_auth(&self.channel_access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error: LineApiResponse = response.json().await.unwrap_or(LineApiResponse {
                message: Some("Unknown error".to_string()),
            });
            Err(NotifyError::Rejected(
                error.message.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }
}

/// Pushes notices to the owner's connected LINE account
#[derive(Clone)]
pub struct LineNotifier {
    db: PgPool,
    client: LineMessagingClient,
}

impl LineNotifier {
    pub fn new(db: PgPool, client: LineMessagingClient) -> Self {
        Self { db, client }
    }

    async fn push(&self, owner_id: Uuid, text: String) -> Result<(), NotifyError> {
        let line_user_id = sqlx::query_scalar::<_, String>(
            "SELECT line_user_id FROM line_connections WHERE user_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        match line_user_id {
            Some(line_user_id) => {
                self.client
                    .send_push_message(&line_user_id, LineMessage::Text { text })
                    .await
            }
            None => {
                tracing::debug!(owner_id = %owner_id, "No LINE connection, skipping push");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn notify_low_stock(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[LowStockNotice],
    ) -> Result<(), NotifyError> {
        self.push(owner_id, low_stock_message(property_name, items)).await
    }

    async fn notify_shortage(
        &self,
        owner_id: Uuid,
        property_name: &str,
        items: &[ShortageNotice],
    ) -> Result<(), NotifyError> {
        self.push(owner_id, shortage_message(property_name, items)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_message_lists_items() {
        let text = low_stock_message(
            "Beach House",
            &[LowStockNotice {
                name: "Toilet paper".to_string(),
                sku: "TP".to_string(),
                current_quantity: 4,
                alert_threshold: 5,
                required_level: 12,
            }],
        );
        assert!(text.starts_with("Low stock after restocking Beach House"));
        assert!(text.contains("Toilet paper (TP): 4 left, alert at 5"));
    }

    #[test]
    fn test_line_message_serialization() {
        let json = serde_json::to_value(LineMessage::Text { text: "hi".to_string() }).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hi");
    }
}
