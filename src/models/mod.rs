//! Data types shared across the channel.

mod credentials;
mod payload;

pub use credentials::{Credentials, DEFAULT_TIMEOUT_SECS};
pub use payload::{DEFAULT_KIND, Endpoint, FILE_KIND, MessagePayload, RouteHint};
