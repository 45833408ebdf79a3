//! # Notification Dispatcher
//!
//! Best-effort delivery of invoices after a sale has committed.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Post-Commit Notification                             │
//! │                                                                         │
//! │  SaleService (sale committed, sendEmail = true)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  NotificationDispatcher::dispatch(&InvoiceMessage)                     │
//! │       │                                                                 │
//! │       ├── email    ──► mail relay (HTTP POST, JSON)   ─┐               │
//! │       │                                                │  each under    │
//! │       └── whatsapp ──► messaging gateway (HTTP POST)  ─┘  a timeout     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  NotificationSummary { results, partialFailure }                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale_notifications rows (one per channel)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A notification problem never reaches the caller as an error. It shows up
//! as a `failed` result and `partialFailure = true`.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use shopdesk_core::{NotificationRecord, NotificationStatus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{EmailSettings, NotificationSettings, WhatsAppSettings};

/// Channel-level failures. Never converted into an API error.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Channel switched off in configuration.
    #[error("Channel is disabled")]
    Disabled,

    /// Nobody to deliver to on this channel.
    #[error("No recipient for this channel")]
    NoRecipient,

    #[error("Transport error: {0}")]
    Transport(String),

    /// Relay answered with a non-success status.
    #[error("Relay rejected the message with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl NotificationError {
    /// Stored status for this outcome.
    pub fn status(&self) -> NotificationStatus {
        match self {
            NotificationError::Disabled => NotificationStatus::Disabled,
            NotificationError::NoRecipient => NotificationStatus::Skipped,
            NotificationError::Transport(_)
            | NotificationError::Rejected { .. }
            | NotificationError::Timeout(_) => NotificationStatus::Failed,
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(err.to_string())
    }
}

/// Everything a channel needs to deliver one invoice.
#[derive(Debug, Clone)]
pub struct InvoiceMessage {
    pub sale_id: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: String,
    /// Rendered plain-text invoice.
    pub document: String,
    pub document_name: String,
}

/// A delivery channel.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable channel name stored with each result ("email", "whatsapp").
    fn name(&self) -> &'static str;

    async fn send(&self, message: &InvoiceMessage) -> Result<(), NotificationError>;
}

// =============================================================================
// Email
// =============================================================================

/// Email through an HTTP mail relay.
pub struct EmailChannel {
    client: reqwest::Client,
    settings: EmailSettings,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    attachments: Vec<RelayAttachment<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    content: &'a str,
}

impl EmailChannel {
    pub fn new(client: reqwest::Client, settings: EmailSettings) -> Self {
        EmailChannel { client, settings }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &InvoiceMessage) -> Result<(), NotificationError> {
        let relay_url = match (&self.settings.relay_url, self.settings.enabled) {
            (Some(url), true) => url,
            _ => return Err(NotificationError::Disabled),
        };
        let to = message
            .email
            .as_deref()
            .ok_or(NotificationError::NoRecipient)?;

        let text = format!(
            "Dear {},\n\nThank you for shopping with us. Your invoice {} is attached.\n",
            message.customer_name, message.invoice_number
        );
        let body = RelayMessage {
            from: &self.settings.from_address,
            to,
            subject: &message.subject,
            text: &text,
            attachments: vec![RelayAttachment {
                filename: &message.document_name,
                content_type: "text/plain",
                content: &message.document,
            }],
        };

        debug!(invoice_number = %message.invoice_number, relay = %relay_url, "Posting invoice to mail relay");

        let response = self.client.post(relay_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(NotificationError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// WhatsApp
// =============================================================================

/// WhatsApp delivery through an HTTP messaging gateway. The invoice goes
/// out as a text document with a short caption.
pub struct WhatsAppChannel {
    client: reqwest::Client,
    settings: WhatsAppSettings,
}

#[derive(Debug, Serialize)]
struct GatewayMessage<'a> {
    to: &'a str,
    caption: String,
    document: GatewayDocument<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayDocument<'a> {
    filename: &'a str,
    mime_type: &'a str,
    content: &'a str,
}

impl WhatsAppChannel {
    pub fn new(client: reqwest::Client, settings: WhatsAppSettings) -> Self {
        WhatsAppChannel { client, settings }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    async fn send(&self, message: &InvoiceMessage) -> Result<(), NotificationError> {
        let gateway_url = match (&self.settings.gateway_url, self.settings.enabled) {
            (Some(url), true) => url,
            _ => return Err(NotificationError::Disabled),
        };
        let to = message
            .phone
            .as_deref()
            .ok_or(NotificationError::NoRecipient)?;

        let body = GatewayMessage {
            to,
            caption: format!(
                "Invoice {} for {}",
                message.invoice_number, message.customer_name
            ),
            document: GatewayDocument {
                filename: &message.document_name,
                mime_type: "text/plain",
                content: &message.document,
            },
        };

        debug!(invoice_number = %message.invoice_number, gateway = %gateway_url, "Posting invoice to WhatsApp gateway");

        let mut request = self.client.post(gateway_url).json(&body);
        if let Some(token) = &self.settings.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotificationError::Rejected {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Result of one channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub channel: String,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Results of one dispatch, returned with the recorded sale.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub results: Vec<ChannelResult>,
    /// At least one channel failed.
    pub partial_failure: bool,
}

impl NotificationSummary {
    /// Rows for `sale_notifications`.
    pub fn to_records(&self, sale_id: &str) -> Vec<NotificationRecord> {
        let now = Utc::now();
        self.results
            .iter()
            .map(|r| NotificationRecord {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                channel: r.channel.clone(),
                status: r.status,
                detail: r.detail.clone(),
                attempted_at: now,
            })
            .collect()
    }
}

/// Owns the configured channels and runs them after commit.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    timeout: Duration,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field(
                "channels",
                &self.channels.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>, timeout: Duration) -> Self {
        NotificationDispatcher { channels, timeout }
    }

    /// Builds email and WhatsApp channels from configuration.
    pub fn from_settings(settings: &NotificationSettings) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        let channels: Vec<Arc<dyn NotificationChannel>> = vec![
            Arc::new(EmailChannel::new(client.clone(), settings.email.clone())),
            Arc::new(WhatsAppChannel::new(client, settings.whatsapp.clone())),
        ];

        info!(
            email = settings.email.is_active(),
            whatsapp = settings.whatsapp.is_active(),
            "Notification channels configured"
        );

        Ok(NotificationDispatcher::new(channels, settings.timeout()))
    }

    /// No channels at all.
    pub fn disabled() -> Self {
        NotificationDispatcher::new(Vec::new(), Duration::from_secs(5))
    }

    /// Sends `message` on every channel, each under the dispatch timeout.
    pub async fn dispatch(&self, message: &InvoiceMessage) -> NotificationSummary {
        let mut summary = NotificationSummary::default();

        for channel in &self.channels {
            let outcome = match tokio::time::timeout(self.timeout, channel.send(message)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(self.timeout)),
            };

            let result = match outcome {
                Ok(()) => {
                    debug!(channel = channel.name(), invoice_number = %message.invoice_number, "Notification sent");
                    ChannelResult {
                        channel: channel.name().to_string(),
                        status: NotificationStatus::Sent,
                        detail: None,
                    }
                }
                Err(e) => {
                    let status = e.status();
                    if status.is_failure() {
                        warn!(
                            channel = channel.name(),
                            invoice_number = %message.invoice_number,
                            error = %e,
                            "Notification failed"
                        );
                    }
                    ChannelResult {
                        channel: channel.name().to_string(),
                        status,
                        detail: Some(e.to_string()),
                    }
                }
            };

            summary.partial_failure |= result.status.is_failure();
            summary.results.push(result);
        }

        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::sync::Mutex;

    fn message(email: Option<&str>) -> InvoiceMessage {
        InvoiceMessage {
            sale_id: "sale-1".into(),
            invoice_number: "INV-2025-000001".into(),
            customer_name: "Asha Verma".into(),
            email: email.map(str::to_string),
            phone: None,
            subject: "Your invoice INV-2025-000001".into(),
            document: "invoice text".into(),
            document_name: "INV-2025-000001.txt".into(),
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl NotificationChannel for FailingChannel {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _message: &InvoiceMessage) -> Result<(), NotificationError> {
            Err(NotificationError::Transport("connection refused".into()))
        }
    }

    struct SlowChannel;

    #[async_trait]
    impl NotificationChannel for SlowChannel {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn send(&self, _message: &InvoiceMessage) -> Result<(), NotificationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    type Received = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_relay(status: u16) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/send",
                post(
                    move |State(store): State<Received>,
                          headers: axum::http::HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get(axum::http::header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        store.lock().await.push((auth, body));
                        axum::http::StatusCode::from_u16(status).unwrap()
                    },
                ),
            )
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/send", addr), received)
    }

    fn email_settings(relay_url: Option<String>) -> EmailSettings {
        EmailSettings {
            enabled: true,
            relay_url,
            from_address: "billing@shopdesk.local".into(),
        }
    }

    #[tokio::test]
    async fn test_email_posts_to_relay() {
        let (url, received) = spawn_relay(202).await;
        let channel = EmailChannel::new(reqwest::Client::new(), email_settings(Some(url)));

        channel.send(&message(Some("asha@example.in"))).await.unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        let body = &received[0].1;
        assert_eq!(body["to"], "asha@example.in");
        assert_eq!(body["attachments"][0]["filename"], "INV-2025-000001.txt");
        assert_eq!(body["attachments"][0]["contentType"], "text/plain");
    }

    fn whatsapp_off() -> Arc<dyn NotificationChannel> {
        Arc::new(WhatsAppChannel::new(
            reqwest::Client::new(),
            WhatsAppSettings::default(),
        ))
    }

    fn whatsapp_settings(gateway_url: Option<String>) -> WhatsAppSettings {
        WhatsAppSettings {
            enabled: true,
            gateway_url,
            api_token: Some("wa-token".into()),
        }
    }

    #[tokio::test]
    async fn test_whatsapp_posts_document_to_gateway() {
        let (url, received) = spawn_relay(200).await;
        let channel = WhatsAppChannel::new(reqwest::Client::new(), whatsapp_settings(Some(url)));

        let mut invoice = message(None);
        invoice.phone = Some("+919812345678".into());
        channel.send(&invoice).await.unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        let (auth, body) = &received[0];
        assert_eq!(auth.as_deref(), Some("Bearer wa-token"));
        assert_eq!(body["to"], "+919812345678");
        assert_eq!(body["document"]["filename"], "INV-2025-000001.txt");
        assert_eq!(body["document"]["mimeType"], "text/plain");
        assert!(body["caption"].as_str().unwrap().contains("INV-2025-000001"));
    }

    #[tokio::test]
    async fn test_whatsapp_outcomes() {
        let (url, _) = spawn_relay(429).await;
        let channel = WhatsAppChannel::new(reqwest::Client::new(), whatsapp_settings(Some(url)));

        let err = channel.send(&message(None)).await.unwrap_err();
        assert_eq!(err.status(), NotificationStatus::Skipped);

        let mut invoice = message(None);
        invoice.phone = Some("+919812345678".into());
        let err = channel.send(&invoice).await.unwrap_err();
        assert!(matches!(err, NotificationError::Rejected { status: 429 }));

        let off = WhatsAppChannel::new(reqwest::Client::new(), WhatsAppSettings::default());
        let err = off.send(&invoice).await.unwrap_err();
        assert_eq!(err.status(), NotificationStatus::Disabled);
    }

    #[tokio::test]
    async fn test_email_relay_rejection() {
        let (url, _) = spawn_relay(503).await;
        let channel = EmailChannel::new(reqwest::Client::new(), email_settings(Some(url)));

        let err = channel.send(&message(Some("asha@example.in"))).await.unwrap_err();
        assert!(matches!(err, NotificationError::Rejected { status: 503 }));
        assert_eq!(err.status(), NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_email_without_relay_or_recipient() {
        let unconfigured = EmailChannel::new(reqwest::Client::new(), email_settings(None));
        let err = unconfigured.send(&message(Some("a@b.in"))).await.unwrap_err();
        assert_eq!(err.status(), NotificationStatus::Disabled);

        let configured = EmailChannel::new(
            reqwest::Client::new(),
            email_settings(Some("http://127.0.0.1:9/send".into())),
        );
        let err = configured.send(&message(None)).await.unwrap_err();
        assert_eq!(err.status(), NotificationStatus::Skipped);
    }

    #[tokio::test]
    async fn test_dispatch_marks_partial_failure() {
        let dispatcher = NotificationDispatcher::new(
            vec![Arc::new(FailingChannel), whatsapp_off()],
            Duration::from_secs(1),
        );

        let summary = dispatcher.dispatch(&message(Some("a@b.in"))).await;

        assert!(summary.partial_failure);
        assert_eq!(summary.results[0].status, NotificationStatus::Failed);
        assert_eq!(summary.results[1].status, NotificationStatus::Disabled);
        assert_eq!(summary.to_records("sale-1").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_times_out_slow_channel() {
        let dispatcher =
            NotificationDispatcher::new(vec![Arc::new(SlowChannel)], Duration::from_millis(100));

        let summary = dispatcher.dispatch(&message(None)).await;

        assert!(summary.partial_failure);
        assert!(summary.results[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("Timed out"));
    }

    #[tokio::test]
    async fn test_disabled_channels_are_not_failures() {
        let dispatcher = NotificationDispatcher::new(
            vec![whatsapp_off()],
            Duration::from_secs(1),
        );

        let summary = dispatcher.dispatch(&message(None)).await;
        assert!(!summary.partial_failure);
        assert!(NotificationDispatcher::disabled()
            .dispatch(&message(None))
            .await
            .results
            .is_empty());
    }
}
