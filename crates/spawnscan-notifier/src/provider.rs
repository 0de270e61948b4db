//! Push provider seam and the Pushbullet implementation.

use std::future::{Future, ready};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::error::DeliveryError;

/// Pushbullet push endpoint.
pub const PUSHBULLET_ENDPOINT: &str = "https://api.pushbullet.com/v2/pushes";

/// A link notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Notification title.
    pub title: String,
    /// Link opened when the notification is tapped.
    pub url: String,
    /// Notification body text.
    pub body: String,
}

/// A service that delivers link notifications to the user's devices.
pub trait PushProvider: Send + Sync {
    /// Deliver one link notification.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the message was not accepted.
    fn push_link(
        &self,
        message: &PushMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

#[derive(Serialize)]
struct PushbulletLink<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'a str,
    url: &'a str,
    body: &'a str,
}

/// Delivers notifications through the Pushbullet REST API.
pub struct PushbulletClient {
    client: reqwest::Client,
    access_token: String,
    endpoint: String,
}

impl PushbulletClient {
    /// Create a client authenticating with `access_token`.
    pub fn new(access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_owned(),
            endpoint: PUSHBULLET_ENDPOINT.to_owned(),
        }
    }

    /// Send pushes to `endpoint` instead of the public API.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        endpoint.clone_into(&mut self.endpoint);
        self
    }
}

impl PushProvider for PushbulletClient {
    async fn push_link(&self, message: &PushMessage) -> Result<(), DeliveryError> {
        let body = PushbulletLink {
            kind: "link",
            title: &message.title,
            url: &message.url,
            body: &message.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Pushbullet request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: error_body,
            });
        }
        Ok(())
    }
}

/// A provider that records messages instead of sending them.
///
/// Used by tests and dry runs. Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingProvider {
    sent: Arc<Mutex<Vec<PushMessage>>>,
    fail: bool,
}

impl RecordingProvider {
    /// A provider that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that rejects every message.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PushProvider for RecordingProvider {
    fn push_link(
        &self,
        message: &PushMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        let result = if self.fail {
            Err(DeliveryError::Rejected {
                status: 401,
                body: String::from("invalid access token"),
            })
        } else {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.clone());
            Ok(())
        };
        ready(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pushbullet_body_shape() {
        let body = PushbulletLink {
            kind: "link",
            title: "Pokemon Found Abra!",
            url: "http://maps.google.com/maps?q=1,2&20z",
            body: "Location",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["type"], "link");
        assert_eq!(value["title"], "Pokemon Found Abra!");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn endpoint_override() {
        let client = PushbulletClient::new("o.key").with_endpoint("http://localhost:1/pushes");
        assert_eq!(client.endpoint, "http://localhost:1/pushes");
    }

    #[tokio::test]
    async fn recording_provider_records_or_fails() {
        let message = PushMessage {
            title: String::from("t"),
            url: String::from("u"),
            body: String::from("b"),
        };

        let provider = RecordingProvider::new();
        provider.push_link(&message).await.unwrap();
        assert_eq!(provider.sent(), vec![message.clone()]);

        let failing = RecordingProvider::failing();
        let result = failing.push_link(&message).await;
        assert!(matches!(result, Err(DeliveryError::Rejected { status: 401, .. })));
        assert!(failing.sent().is_empty());
    }
}
