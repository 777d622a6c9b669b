//! Configuration types for registry client.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reference::api_host_for;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a single registry host.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry host as it appears in references (e.g., "registry.example.com:5000").
    pub host: String,

    /// Base URL of the registry API, derived from the host and TLS mode.
    ///
    /// Docker Hub is served from `registry-1.docker.io`.
    pub url: String,

    /// Authentication configuration.
    pub auth: RegistryAuth,

    /// Request timeout.
    pub timeout: Duration,

    /// TLS mode.
    pub tls: TlsMode,

    /// Extra CA certificate trusted for this host.
    pub ca_cert: Option<PathBuf>,

    /// User agent string.
    pub user_agent: String,
}

impl RegistryConfig {
    /// Creates a configuration for the given host with TLS enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("registry.example.com");
    /// assert_eq!(config.url, "https://registry.example.com");
    /// ```
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            url: TlsMode::Enabled.base_url(&host),
            host,
            auth: RegistryAuth::None,
            timeout: DEFAULT_TIMEOUT,
            tls: TlsMode::Enabled,
            ca_cert: None,
            user_agent: format!("iris-registry/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the TLS mode and recomputes the base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::{RegistryConfig, TlsMode};
    ///
    /// let config = RegistryConfig::new("localhost:5000").with_tls(TlsMode::Disabled);
    /// assert_eq!(config.url, "http://localhost:5000");
    /// ```
    #[must_use]
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self.url = tls.base_url(&self.host);
        self
    }

    /// Trusts an additional CA certificate.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }
}

/// How to secure the connection to a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// HTTPS with certificate verification.
    #[default]
    Enabled,
    /// HTTPS without certificate verification.
    Insecure,
    /// Plain HTTP.
    Disabled,
}

impl TlsMode {
    /// Returns the API base URL for the registry named `host`.
    #[must_use]
    pub fn base_url(self, host: &str) -> String {
        let host = api_host_for(host);
        match self {
            Self::Enabled | Self::Insecure => format!("https://{host}"),
            Self::Disabled => format!("http://{host}"),
        }
    }

    /// Returns the lowercase name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Insecure => "insecure",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for TlsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "insecure" => Ok(Self::Insecure),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!("unknown TLS mode: {other}")),
        }
    }
}

/// Authentication methods for registry access.
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// Anonymous access.
    None,

    /// Basic authentication (username/password or username/token).
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },

    /// Static bearer token.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl RegistryAuth {
    /// Creates basic authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::RegistryAuth;
    ///
    /// let auth = RegistryAuth::basic("user", "pass");
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}
