#![expect(
    clippy::module_name_repetitions,
    reason = "`PesapalConfig` and `RawPesapalConfig` are re-exported at the crate root"
)]

use std::env;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::{CHECKOUT_URL, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Claim value carried in the bearer-flow JWT placeholder signature.
pub const DEFAULT_JWT_USERNAME: &str = "TECH_AIR";

/// Gateway deployment the token endpoint lives on.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Environment {
    Production,
    #[default]
    Sandbox,
}

impl Environment {
    #[must_use]
    pub const fn base_url_str(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Sandbox => SANDBOX_BASE_URL,
        }
    }

    pub fn base_url(self) -> Result<Url> {
        Ok(Url::parse(self.base_url_str())?)
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" | "live" => Ok(Environment::Production),
            "sandbox" | "demo" | "test" => Ok(Environment::Sandbox),
            other => Err(Error::validation(format!(
                "invalid environment `{other}`; expected one of: production|sandbox"
            ))),
        }
    }
}

/// Raw string configuration, typically deserialized from a file or assembled from env vars.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize)]
pub struct RawPesapalConfig {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub jwt_username: Option<String>,
}

impl RawPesapalConfig {
    /// Credentials only; every optional setting falls back to its default.
    #[must_use]
    pub fn new<S: Into<String>>(consumer_key: S, consumer_secret: SecretString) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret,
            environment: None,
            base_url: None,
            checkout_url: None,
            timeout_secs: None,
            jwt_username: None,
        }
    }
}

/// Validated client configuration.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct PesapalConfig {
    pub base_url: Url,
    pub checkout_url: Url,
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub jwt_username: String,
    pub timeout: Duration,
}

impl PesapalConfig {
    pub fn new<S: Into<String>>(
        environment: Environment,
        consumer_key: S,
        consumer_secret: SecretString,
    ) -> Result<Self> {
        let config = Self {
            base_url: environment.base_url()?,
            checkout_url: Url::parse(CHECKOUT_URL)?,
            consumer_key: consumer_key.into(),
            consumer_secret,
            jwt_username: DEFAULT_JWT_USERNAME.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_raw(raw: RawPesapalConfig) -> Result<Self> {
        let environment = raw
            .environment
            .as_deref()
            .map(Environment::from_str)
            .transpose()?
            .unwrap_or_default();

        let mut config = Self {
            base_url: match raw.base_url.as_deref() {
                Some(url) => Url::parse(url)?,
                None => environment.base_url()?,
            },
            checkout_url: Url::parse(raw.checkout_url.as_deref().unwrap_or(CHECKOUT_URL))?,
            consumer_key: raw.consumer_key,
            consumer_secret: raw.consumer_secret,
            jwt_username: DEFAULT_JWT_USERNAME.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        };
        if let Some(secs) = raw.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(username) = raw.jwt_username {
            config.jwt_username = username;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads `PESAPAL_*` environment variables.
    ///
    /// `PESAPAL_CONSUMER_KEY` and `PESAPAL_CONSUMER_SECRET` are required; the rest fall back
    /// to sandbox defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`Self::from_env`], resolving each `PESAPAL_*` name through `lookup`.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| Error::validation(format!("{name} is not set")))
        };

        let timeout_secs = optional("PESAPAL_TIMEOUT_SECS")
            .map(|secs| {
                secs.trim().parse::<u64>().map_err(|e| {
                    Error::validation(format!("invalid PESAPAL_TIMEOUT_SECS `{secs}`: {e}"))
                })
            })
            .transpose()?;

        Self::from_raw(RawPesapalConfig {
            consumer_key: required("PESAPAL_CONSUMER_KEY")?,
            consumer_secret: required("PESAPAL_CONSUMER_SECRET")?.into(),
            environment: optional("PESAPAL_ENVIRONMENT"),
            base_url: optional("PESAPAL_BASE_URL"),
            checkout_url: optional("PESAPAL_CHECKOUT_URL"),
            timeout_secs,
            jwt_username: optional("PESAPAL_JWT_USERNAME"),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_checkout_url(mut self, checkout_url: Url) -> Self {
        self.checkout_url = checkout_url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_jwt_username<S: Into<String>>(mut self, username: S) -> Self {
        self.jwt_username = username.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.consumer_key.trim().is_empty() {
            return Err(Error::validation("consumer key must not be empty"));
        }
        if self.consumer_secret.expose_secret().is_empty() {
            return Err(Error::validation("consumer secret must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(Error::validation("timeout must be greater than zero"));
        }
        for (field, url) in [("base_url", &self.base_url), ("checkout_url", &self.checkout_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::validation(format!(
                    "{field} must be an http(s) URL, got `{url}`"
                )));
            }
        }
        Ok(())
    }
}
