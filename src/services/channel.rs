//! Compass notification channel
//!
//! Resolves the routing target and credential set for a notification, reuses
//! a pooled client, uploads an attachment when one is pending, and posts the
//! message to the matching endpoint.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CompassError, CompassResult};
use crate::external::compass::CompassClientFactory;
use crate::models::{Credentials, DEFAULT_KIND, MessagePayload, RouteHint};

/// Channel name recipients are queried with
pub const CHANNEL_NAME: &str = "compass";

/// Conversion boundary for notification objects.
///
/// A notification either produces a Compass payload or returns `None`,
/// decided once at this boundary. `None` makes the send a silent no-op, not
/// an error.
pub trait CompassNotification: Send + Sync {
    fn to_compass(&self, recipient: &dyn CompassRecipient) -> Option<MessagePayload>;
}

/// Routing boundary for recipient objects.
///
/// The default body reports no routing information, which matches recipients
/// that route entirely through the payload.
pub trait CompassRecipient: Send + Sync {
    fn route_notification_for(&self, channel: &str) -> RouteHint {
        let _ = channel;
        RouteHint::None
    }
}

/// Read-only credential lookup injected into the channel
pub trait CredentialsProvider: Send + Sync {
    /// Bot used when the payload does not select one
    fn default_bot(&self) -> &str;

    /// Credentials for the named bot
    fn credentials_for(&self, bot: &str) -> CompassResult<Credentials>;
}

/// Outcome of a delivered send
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Identifier of the delivered message
    MessageId(String),
    /// Raw response object when the API did not return a message id
    Raw(Map<String, Value>),
}

/// One-shot notification dispatcher for the Compass API.
///
/// Holds the shared client pool and the credential provider; each `send` is
/// a straight-line pipeline with no retries.
pub struct CompassChannel {
    factory: Arc<CompassClientFactory>,
    config: Arc<dyn CredentialsProvider>,
}

impl CompassChannel {
    pub fn new(factory: Arc<CompassClientFactory>, config: Arc<dyn CredentialsProvider>) -> Self {
        Self { factory, config }
    }

    /// Sends `notification` to `recipient`.
    ///
    /// Returns `Ok(None)` when the notification has no Compass payload.
    /// Otherwise returns the delivered message id, or the raw response when
    /// the API did not include one.
    ///
    /// # Errors
    /// - invalid-argument when no routing target is present or the selected
    ///   bot has no usable credentials
    /// - API / transport errors from the upload and send calls
    pub async fn send(
        &self,
        recipient: &dyn CompassRecipient,
        notification: &dyn CompassNotification,
    ) -> CompassResult<Option<Delivery>> {
        let Some(mut payload) = notification.to_compass(recipient) else {
            debug!("notification has no Compass payload, skipping");
            return Ok(None);
        };

        payload.apply_hint(recipient.route_notification_for(CHANNEL_NAME));

        let bot = payload
            .bot
            .take()
            .unwrap_or_else(|| self.config.default_bot().to_string());
        let credentials = self.config.credentials_for(&bot)?;
        let client = self.factory.make(credentials)?;

        if payload.is_file() && payload.file_id.is_none() {
            if let Some(file) = payload.file.take() {
                let file_id = client.upload_file(Path::new(&file)).await?;
                payload.file_id = Some(file_id);
            }
        }

        let endpoint = payload.endpoint().ok_or_else(|| {
            CompassError::invalid_argument(
                "CompassChannel: one of user_id, group_id or message_id is required",
            )
        })?;

        if payload.kind.is_none() {
            payload.kind = Some(DEFAULT_KIND.to_string());
        }

        debug!(endpoint = endpoint.as_str(), bot = %bot, "sending Compass notification");
        let mut response = client.post_json(endpoint.as_str(), &payload).await?;

        Ok(Some(match response.remove("message_id") {
            Some(Value::String(id)) => Delivery::MessageId(id),
            Some(Value::Number(id)) => Delivery::MessageId(id.to_string()),
            Some(other) => {
                // not a usable id; hand the caller the untouched response
                response.insert("message_id".to_string(), other);
                Delivery::Raw(response)
            }
            None => Delivery::Raw(response),
        }))
    }
}
