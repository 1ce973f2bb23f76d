//! Signed direct-order checkout (`GET PostPesapalDirectOrderV4`).
#![expect(
    clippy::module_name_repetitions,
    reason = "checkout types are re-exported at the crate root where the prefix disambiguates"
)]

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use rand::Rng as _;
use rand::distr::Alphanumeric;
use reqwest::{Client as ReqwestClient, Method, StatusCode};
use secrecy::ExposeSecret as _;
use url::Url;

use crate::auth::{AuthToken, Credentials};
use crate::error::Error;
use crate::order::OrderDescriptor;
use crate::signing::{HmacSha1Signer, JwtSigner};
use crate::{Result, Timestamp};

pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH_NONCE: &str = "oauth_nonce";
pub const PESAPAL_REQUEST_DATA: &str = "pesapal_request_data";

const NONCE_LEN: usize = 16;

/// Fresh per-request nonce: lowercase alphanumerics from the thread-local CSPRNG.
#[must_use]
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(NONCE_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// The oauth/pesapal query parameters, kept sorted by key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignatureParams(BTreeMap<&'static str, String>);

impl SignatureParams {
    #[must_use]
    pub fn new(consumer_key: &str, timestamp: Timestamp, nonce: &str, request_data: String) -> Self {
        let mut params = BTreeMap::new();
        params.insert(OAUTH_CONSUMER_KEY, consumer_key.to_owned());
        params.insert(OAUTH_SIGNATURE_METHOD, HmacSha1Signer::METHOD.to_owned());
        params.insert(OAUTH_SIGNATURE, String::new());
        params.insert(OAUTH_TIMESTAMP, timestamp.to_string());
        params.insert(OAUTH_NONCE, nonce.to_owned());
        params.insert(PESAPAL_REQUEST_DATA, request_data);
        Self(params)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        self.get(OAUTH_SIGNATURE).unwrap_or_default()
    }

    pub fn set_signature(&mut self, signature: String) {
        self.0.insert(OAUTH_SIGNATURE, signature);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Sorted, unencoded `k=v&k=v` concatenation; the input to the HMAC-SHA1 base string.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Per-request overrides, mostly for reproducible signatures in tests.
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct CheckoutOverrides {
    pub timestamp: Option<Timestamp>,
    pub nonce: Option<String>,
}

impl CheckoutOverrides {
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// A fully signed checkout request, ready to send or to embed as a redirect URL.
#[derive(Clone, Debug)]
pub struct SignedCheckout {
    endpoint: Url,
    params: SignatureParams,
}

impl SignedCheckout {
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn params(&self) -> &SignatureParams {
        &self.params
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        self.params.signature()
    }

    /// Endpoint with every parameter form-encoded into the query; usable as the iframe `src`.
    #[must_use]
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(self.params.iter());
        url
    }
}

#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct CheckoutResponse {
    pub status_code: StatusCode,
    /// Signed request URL, the hosted payment page to embed.
    pub iframe_url: Url,
    /// Where the gateway ended up after following redirects.
    pub final_url: Url,
    pub body: String,
}

/// Builds and signs the checkout request.
///
/// The `oauth_signature` slot is first filled with the bearer-flow JWT, serialized with the
/// other parameters, and then overwritten by the HMAC-SHA1 signature over that string.
pub fn sign(
    endpoint: &Url,
    credentials: &Credentials,
    jwt: &JwtSigner,
    hmac: &HmacSha1Signer,
    token: &AuthToken,
    order: &OrderDescriptor,
    overrides: &CheckoutOverrides,
) -> Result<SignedCheckout> {
    if token.is_expired() {
        return Err(Error::validation(format!(
            "bearer token expired at {}; authenticate again",
            token.expires_at()
        )));
    }
    order.validate()?;

    let request_data = order.to_xml()?;
    let timestamp = overrides
        .timestamp
        .unwrap_or_else(|| Utc::now().timestamp());
    let nonce = overrides.nonce.clone().unwrap_or_else(generate_nonce);

    let mut params = SignatureParams::new(credentials.key(), timestamp, &nonce, request_data);

    let placeholder = jwt.sign(&Method::POST, endpoint.as_str(), params.iter())?;
    params.set_signature(placeholder);

    let serialized = params.serialize();
    let signature = hmac.sign(
        endpoint.as_str(),
        &serialized,
        Some(token.token().expose_secret()),
    )?;
    params.set_signature(signature);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        key = %credentials.key(),
        reference = %order.reference,
        timestamp,
        nonce = %nonce,
        "signed checkout request"
    );

    Ok(SignedCheckout {
        endpoint: endpoint.clone(),
        params,
    })
}

/// Sends the signed request and returns the hosted payment page, giving up after `timeout`.
pub async fn initiate(
    client: &ReqwestClient,
    signed: &SignedCheckout,
    timeout: Duration,
) -> Result<CheckoutResponse> {
    let pairs: Vec<(&str, &str)> = signed.params.iter().collect();
    let request = client
        .request(Method::GET, signed.endpoint.clone())
        .timeout(timeout)
        .query(&pairs)
        .build()?;

    let response = crate::send(client, request).await?;
    let status_code = response.status();
    let final_url = response.url().clone();
    let body = response.text().await?;

    if !status_code.is_success() {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            status = %status_code,
            path = %signed.endpoint.path(),
            body = %body,
            "checkout initiation failed"
        );

        return Err(Error::checkout_failed(
            status_code,
            Method::GET,
            signed.endpoint.path().to_owned(),
            body,
        ));
    }

    Ok(CheckoutResponse {
        status_code,
        iframe_url: signed.url(),
        final_url,
        body,
    })
}
