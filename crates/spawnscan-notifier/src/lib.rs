//! Push notifications for newly discovered Spawnscan sightings.
//!
//! # Modules
//!
//! - [`dispatcher`] -- Background task that notifies each sighting once.
//! - [`error`] -- [`DeliveryError`](error::DeliveryError).
//! - [`notifier`] -- Allow/deny policy and message formatting.
//! - [`provider`] -- [`PushProvider`](provider::PushProvider) seam and the
//!   Pushbullet client.

pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod provider;

pub use dispatcher::{Dispatcher, SightingSender, drain_dispatcher, spawn_dispatcher};
pub use error::DeliveryError;
pub use notifier::{Notifier, NotifyOutcome};
pub use provider::{PushMessage, PushProvider, PushbulletClient, RecordingProvider};
