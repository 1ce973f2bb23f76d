//! Token authentication against `POST {base}/Auth/RequestToken`.
#![expect(
    clippy::module_name_repetitions,
    reason = "`AuthToken`, `AuthResult` and `AuthFailure` are re-exported at the crate root"
)]

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::Result;
use crate::error::Error;

const STATUS_OK: &str = "200";
const INVALID_SERVER_RESPONSE: &str = "invalid server response";

/// Consumer key/secret pair identifying the merchant integration.
#[derive(Clone, Debug)]
pub struct Credentials {
    key: String,
    secret: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new<S: Into<String>>(key: S, secret: SecretString) -> Self {
        Self {
            key: key.into(),
            secret,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

/// Bearer token plus its UTC expiry. The gateway issues these for about five minutes.
#[derive(Clone, Debug)]
pub struct AuthToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    #[must_use]
    pub fn new(token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    #[must_use]
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    /// HTTP 200 with a non-`"200"` status; code and message come from the body's `error` object.
    Gateway { code: String, message: String },
    /// Any HTTP status other than 200.
    UnexpectedResponse { status_code: StatusCode },
}

impl AuthFailure {
    /// Gateway error code, or the HTTP status code for unexpected responses.
    #[must_use]
    pub fn error(&self) -> String {
        match self {
            AuthFailure::Gateway { code, .. } => code.clone(),
            AuthFailure::UnexpectedResponse { status_code } => status_code.as_u16().to_string(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            AuthFailure::Gateway { message, .. } => message,
            AuthFailure::UnexpectedResponse { .. } => INVALID_SERVER_RESPONSE,
        }
    }
}

impl From<AuthFailure> for Error {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::Gateway { code, message } => Error::authentication(code, message),
            AuthFailure::UnexpectedResponse { status_code } => {
                Error::unexpected_response(status_code)
            }
        }
    }
}

/// Outcome of a token request. Gateway-level failures are data, not errors.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum AuthResult {
    Success(AuthToken),
    Failed(AuthFailure),
}

impl AuthResult {
    /// `"success"` or `"failed"`.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            AuthResult::Success(_) => "success",
            AuthResult::Failed(_) => "failed",
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success(_))
    }

    #[must_use]
    pub fn token(&self) -> Option<&AuthToken> {
        match self {
            AuthResult::Success(token) => Some(token),
            AuthResult::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            AuthResult::Success(_) => None,
            AuthResult::Failed(failure) => Some(failure),
        }
    }

    /// Upgrades a failure to [`crate::Kind::Authentication`] or
    /// [`crate::Kind::UnexpectedResponse`].
    pub fn into_result(self) -> Result<AuthToken> {
        match self {
            AuthResult::Success(token) => Ok(token),
            AuthResult::Failed(failure) => Err(failure.into()),
        }
    }
}

#[derive(Serialize)]
struct TokenRequest<'creds> {
    consumer_key: &'creds str,
    consumer_secret: &'creds str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(deserialize_with = "lenient_string")]
    status: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "expiryDate")]
    expiry_date: Option<String>,
    #[serde(default)]
    error: Option<GatewayError>,
}

#[derive(Deserialize)]
struct GatewayError {
    #[serde(default, deserialize_with = "lenient_string")]
    code: String,
    #[serde(default, deserialize_with = "lenient_string")]
    message: String,
}

/// Status and error fields are documented as strings; numbers and null are tolerated.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

pub(crate) fn token_endpoint(base_url: &Url) -> Result<Url> {
    Ok(Url::parse(&format!(
        "{}/Auth/RequestToken",
        base_url.as_str().trim_end_matches('/')
    ))?)
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Parses the gateway's expiry, which is either RFC 3339 or an offset-less UTC timestamp.
pub(crate) fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::decode(format!("invalid expiryDate `{value}`: {e}")))
}

/// Exchanges `credentials` for a bearer token, giving up after `timeout`.
///
/// Only transport faults and undecodable 200 bodies are returned as `Err`.
pub async fn authenticate(
    client: &ReqwestClient,
    base_url: &Url,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<AuthResult> {
    let body = TokenRequest {
        consumer_key: credentials.key(),
        consumer_secret: credentials.secret().expose_secret(),
    };
    let request = client
        .request(Method::POST, token_endpoint(base_url)?)
        .headers(json_headers())
        .timeout(timeout)
        .json(&body)
        .build()?;

    let response = crate::send(client, request).await?;
    let status_code = response.status();

    if status_code != StatusCode::OK {
        #[cfg(feature = "tracing")]
        tracing::warn!(status = %status_code, key = %credentials.key(), "token request rejected");

        return Ok(AuthResult::Failed(AuthFailure::UnexpectedResponse {
            status_code,
        }));
    }

    let value = response.json::<Value>().await?;
    let body: TokenResponse = crate::decode(&value)?;

    if body.status != STATUS_OK {
        let (code, message) = body
            .error
            .map_or_else(Default::default, |e| (e.code, e.message));

        #[cfg(feature = "tracing")]
        tracing::warn!(
            gateway_status = %body.status,
            code = %code,
            message = %message,
            "gateway refused token request"
        );

        return Ok(AuthResult::Failed(AuthFailure::Gateway { code, message }));
    }

    let token = body
        .token
        .ok_or_else(|| Error::decode("token missing from successful response"))?;
    let expiry = body
        .expiry_date
        .ok_or_else(|| Error::decode("expiryDate missing from successful response"))?;
    let expires_at = parse_expiry(&expiry)?;

    #[cfg(feature = "tracing")]
    tracing::info!(key = %credentials.key(), expires_at = %expires_at, "obtained bearer token");

    Ok(AuthResult::Success(AuthToken::new(token.into(), expires_at)))
}
