//! Immutable credential triple for one Compass bot.

use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::{CompassError, CompassResult};

/// Request timeout applied when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Authentication material and transport settings for one bot.
///
/// Constructed only through [`Credentials::new`], which validates the token
/// and base URL and normalizes the URL to exactly one trailing slash. The
/// fields are immutable afterwards, so the pool key stays stable for the
/// lifetime of the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    base_url: String,
    timeout: Duration,
}

impl Credentials {
    /// Validates and normalizes the credential triple.
    ///
    /// # Errors
    /// Returns an invalid-argument error when the token or base URL is empty.
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> CompassResult<Self> {
        let token = token.into();
        let base_url = base_url.into();

        if token.is_empty() || base_url.is_empty() {
            return Err(CompassError::invalid_argument(
                "CompassClientFactory: token and base_url are required",
            ));
        }

        Ok(Self {
            token,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            timeout: timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }

    /// API token sent as `Authorization: bearer=<token>`
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Base URL all endpoints are resolved against; always ends with `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stable pool key: SHA-256 hex digest over the credential triple.
    ///
    /// Equal triples always hash to the same key, so the factory never builds
    /// two clients for the same credentials.
    pub fn pool_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.token.as_bytes());
        hasher.update(b"|");
        hasher.update(self.base_url.as_bytes());
        hasher.update(b"|");
        hasher.update(self.timeout.as_secs().to_string().as_bytes());

        let digest = hasher.finalize();
        let mut key = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(&mut key, "{byte:02x}");
        }
        key
    }
}

// Keep the token out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
