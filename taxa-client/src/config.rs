//! Connection configuration for the framework service.

use crate::error::{ClientError, Result};

/// Environment variable holding the service base URL.
pub const ENV_INTERFACE_URL: &str = "TAXA_INTERFACE_URL";
/// Environment variable holding the tenant identifier.
pub const ENV_TENANT_ID: &str = "TAXA_TENANT_ID";
/// Environment variable holding the bearer token.
pub const ENV_AUTH_TOKEN: &str = "TAXA_AUTH_TOKEN";
/// Environment variable holding the session cookie.
pub const ENV_COOKIE: &str = "TAXA_COOKIE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection parameters for the framework service.
///
/// Every request carries the tenant id, bearer token, and session cookie as
/// headers; all four values are required.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the framework service
    pub base_url: String,
    /// Tenant identifier, sent as the `tenantId` header
    pub tenant_id: String,
    /// Bearer token for the `Authorization` header
    pub auth_token: String,
    /// Session cookie, sent verbatim as the `Cookie` header
    pub cookie: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a config with the default timeout.
    pub fn new(
        base_url: impl Into<String>,
        tenant_id: impl Into<String>,
        auth_token: impl Into<String>,
        cookie: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            auth_token: auth_token.into(),
            cookie: cookie.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read the config from process environment variables.
    ///
    /// Fails with [`ClientError::Config`] naming the first missing variable,
    /// before any network attempt is made.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read the config from an arbitrary variable source.
    ///
    /// Useful for hosts that load settings from somewhere other than the
    /// process environment, and for tests.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self::new(
            required(&lookup, ENV_INTERFACE_URL)?,
            required(&lookup, ENV_TENANT_ID)?,
            required(&lookup, ENV_AUTH_TOKEN)?,
            required(&lookup, ENV_COOKIE)?,
        ))
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ClientError::Config(format!(
            "missing required variable {}",
            name
        ))),
    }
}
