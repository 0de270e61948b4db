//! Notification policy and message formatting.
//!
//! The policy is evaluated in order:
//!
//! 1. no provider configured: skip;
//! 2. an allow-list is configured: notify only names on it;
//! 3. otherwise, a deny-list is configured: skip names on it;
//! 4. otherwise notify.
//!
//! Names are compared lower-cased. An allow-list makes the deny-list
//! irrelevant, even for names on both.

use chrono::{DateTime, Local};
use spawnscan_core::NotifierConfig;
use spawnscan_types::{Sighting, display_name};
use tracing::{debug, info};

use crate::error::DeliveryError;
use crate::provider::{PushMessage, PushProvider, PushbulletClient};

/// Zoom level of the map link.
const MAP_ZOOM: u8 = 20;

/// What [`Notifier::notify`] did with a sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// A message was delivered.
    Sent,
    /// No provider is configured.
    Disabled,
    /// An allow-list is configured and the name is not on it.
    NotAllowed,
    /// The name is on the deny-list.
    Denied,
}

/// Decides whether a sighting warrants a push, and sends it.
pub struct Notifier<P> {
    provider: Option<P>,
    allow: Option<Vec<String>>,
    deny: Option<Vec<String>>,
}

impl Notifier<PushbulletClient> {
    /// Build a Pushbullet-backed notifier from configuration.
    ///
    /// Without a Pushbullet key the notifier is disabled.
    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(
            config.pushbullet_key().map(PushbulletClient::new),
            config.allow_list(),
            config.deny_list(),
        )
    }
}

impl<P: PushProvider> Notifier<P> {
    /// Create a notifier. List entries are compared lower-cased.
    pub fn new(provider: Option<P>, allow: Option<Vec<String>>, deny: Option<Vec<String>>) -> Self {
        let lower = |names: Vec<String>| -> Vec<String> {
            names.iter().map(|n| n.trim().to_lowercase()).collect()
        };
        Self {
            provider,
            allow: allow.map(lower),
            deny: deny.map(lower),
        }
    }

    /// A notifier that never sends anything.
    pub const fn disabled() -> Self {
        Self {
            provider: None,
            allow: None,
            deny: None,
        }
    }

    /// Whether a provider is configured.
    pub const fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// The configured provider.
    pub const fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    /// Apply the policy to a lower-cased name without sending anything.
    ///
    /// Returns `None` when the name should be notified.
    pub fn screen(&self, name: &str) -> Option<NotifyOutcome> {
        if self.provider.is_none() {
            return Some(NotifyOutcome::Disabled);
        }
        if let Some(allow) = &self.allow {
            return (!allow.iter().any(|n| n == name)).then_some(NotifyOutcome::NotAllowed);
        }
        if let Some(deny) = &self.deny {
            return deny.iter().any(|n| n == name).then_some(NotifyOutcome::Denied);
        }
        None
    }

    /// Notify about one sighting if the policy allows it.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the provider did not accept the
    /// message. Nothing is retried.
    pub async fn notify(&self, sighting: &Sighting) -> Result<NotifyOutcome, DeliveryError> {
        let name = display_name(sighting.entity_id);
        let lower = name.to_lowercase();
        if let Some(skipped) = self.screen(&lower) {
            debug!(name = %lower, outcome = ?skipped, "Sighting not notified");
            return Ok(skipped);
        }
        let Some(provider) = &self.provider else {
            return Ok(NotifyOutcome::Disabled);
        };

        info!(name = %lower, hash = %sighting.hash, "Notifier found sighting");
        provider.push_link(&build_message(sighting)).await?;
        Ok(NotifyOutcome::Sent)
    }
}

/// Format the push message for a sighting.
pub fn build_message(sighting: &Sighting) -> PushMessage {
    let name = display_name(sighting.entity_id);
    let url = map_link(sighting.lat, sighting.lng);
    let until = DateTime::from_timestamp(sighting.disappear_time, 0).map_or_else(
        || sighting.expire_time.clone(),
        |at| at.with_timezone(&Local).format("%-I:%M%p").to_string(),
    );

    PushMessage {
        title: format!("Pokemon Found {name}!"),
        body: format!("Location : {url}. {name} Available till {until}."),
        url,
    }
}

/// Map link centered on a position.
pub fn map_link(lat: f64, lng: f64) -> String {
    format!("http://maps.google.com/maps?q={lat},{lng}&{MAP_ZOOM}z")
}
