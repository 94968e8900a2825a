//! Configuration types for the background removal client

use crate::error::{BgClientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout for remote calls. Background removal of a large
/// image can take a while, so the client waits generously.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Server-side background removal engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engine {
    /// The `withoutbg` engine (default)
    WithoutBg,
    /// The `rembg` engine
    Rembg,
}

impl Default for Engine {
    fn default() -> Self {
        Self::WithoutBg
    }
}

impl Engine {
    /// Wire identifier sent in the `engine` field of upload requests
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WithoutBg => "withoutbg",
            Self::Rembg => "rembg",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Engine {
    type Err = BgClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "withoutbg" => Ok(Self::WithoutBg),
            "rembg" => Ok(Self::Rembg),
            other => Err(BgClientError::invalid_config(format!(
                "Unknown engine '{}'. Supported engines: withoutbg, rembg",
                other
            ))),
        }
    }
}

/// Configuration for the background removal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote service, without a trailing slash
    pub base_url: String,

    /// Engine used for uploads unless overridden per session
    pub engine: Engine,

    /// Request timeout applied to every remote call
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            engine: Engine::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder for fluent API construction
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bgremove_client::{ClientConfig, Engine};
    ///
    /// let config = ClientConfig::builder()
    ///     .base_url("https://bg.example.com")
    ///     .engine(Engine::Rembg)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.base_url, "https://bg.example.com");
    /// ```
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Empty base URL
    /// - Base URL without an `http` or `https` scheme
    /// - Zero request timeout
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(BgClientError::invalid_config("Base URL must not be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BgClientError::invalid_config(format!(
                "Base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(BgClientError::invalid_config(
                "Request timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    engine: Option<Engine>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the base URL of the remote service. A trailing slash is stripped
    /// so endpoint paths can be joined verbatim.
    #[must_use]
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        let url = base_url.into();
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Set the default processing engine
    #[must_use]
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any validation failure from [`ClientConfig::validate`]
    pub fn build(self) -> Result<ClientConfig> {
        let defaults = ClientConfig::default();
        let config = ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            engine: self.engine.unwrap_or(defaults.engine),
            timeout: self.timeout.unwrap_or(defaults.timeout),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine, Engine::WithoutBg);
    }

    #[test]
    fn test_builder_strips_trailing_slash() {
        let config = ClientConfig::builder()
            .base_url("https://bg.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "https://bg.example.com");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let result = ClientConfig::builder().base_url("bg.example.com").build();
        assert!(matches!(result, Err(BgClientError::InvalidConfig(_))));

        let result = ClientConfig::builder().base_url("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ClientConfig::builder()
            .timeout(Duration::from_secs(0))
            .build();
        assert!(matches!(result, Err(BgClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_engine_round_trip() {
        for engine in [Engine::WithoutBg, Engine::Rembg] {
            let parsed: Engine = engine.as_str().parse().unwrap();
            assert_eq!(parsed, engine);
        }
    }

    #[test]
    fn test_engine_rejects_unknown_selector() {
        let result: Result<Engine> = "magic".parse();
        assert!(matches!(result, Err(BgClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_engine_display() {
        assert_eq!(Engine::WithoutBg.to_string(), "withoutbg");
        assert_eq!(Engine::Rembg.to_string(), "rembg");
    }
}
