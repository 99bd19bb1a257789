//! Compass Channel Library
//!
//! Notification delivery adapter for the Compass messaging API: resolves a
//! routing target, pools authenticated clients per credential set, uploads
//! attachments, and posts the message to the matching endpoint.

pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod services;

pub use config::{ConfigLoader, Settings};
pub use error::{CompassError, CompassResult};
pub use external::compass::{CompassClient, CompassClientFactory};
pub use models::{Credentials, Endpoint, MessagePayload, RouteHint};
pub use services::channel::{
    CompassChannel, CompassNotification, CompassRecipient, CredentialsProvider, Delivery,
};
