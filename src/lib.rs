#![cfg_attr(docsrs, feature(doc_cfg))]

//! Client for the PesaPal payment gateway.
//!
//! Two calls make up a hosted checkout:
//! - [`PesapalClient::authenticate`] trades the consumer key/secret for a short-lived bearer token
//! - [`PesapalClient::initiate_checkout`] signs an order with the legacy OAuth 1.0 HMAC-SHA1
//!   scheme and fetches the hosted payment page (the iframe source)
//!
//! ```no_run
//! use pesapal_client::{Environment, PesapalClient, PesapalConfig};
//! use pesapal_client::order::OrderDescriptor;
//! use rust_decimal_macros::dec;
//!
//! # async fn run() -> pesapal_client::Result<()> {
//! let config = PesapalConfig::new(Environment::Sandbox, "key", "secret".into())?;
//! let client = PesapalClient::new(config)?;
//!
//! let order = OrderDescriptor::builder()
//!     .amount(dec!(100))
//!     .currency("UGX")
//!     .description("Test Order")
//!     .reference("1")
//!     .build();
//!
//! let checkout = client.checkout(&order).await?;
//! println!("{}", checkout.iframe_url);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod order;
pub mod signing;

use reqwest::{Client as ReqwestClient, Request, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use auth::{AuthFailure, AuthResult, AuthToken, Credentials};
pub use checkout::{CheckoutOverrides, CheckoutResponse, SignedCheckout};
pub use client::PesapalClient;
pub use config::{Environment, PesapalConfig, RawPesapalConfig};
pub use error::{Error, Kind};

pub type Result<T> = std::result::Result<T, Error>;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

pub const PRODUCTION_BASE_URL: &str = "https://pay.pesapal.com/v3/api";
pub const SANDBOX_BASE_URL: &str = "https://cybqa.pesapal.com/pesapalv3/api";
pub const CHECKOUT_URL: &str = "https://www.pesapal.com/API/PostPesapalDirectOrderV4";

/// Executes `request` and hands back the raw response regardless of status.
///
/// Only transport faults are errors here; status classification is left to the caller
/// since the token and checkout endpoints treat non-success statuses differently.
async fn send(client: &ReqwestClient, request: Request) -> Result<ReqwestResponse> {
    #[cfg(feature = "tracing")]
    let (method, path) = (request.method().clone(), request.url().path().to_owned());

    let response = client.execute(request).await;

    #[cfg(feature = "tracing")]
    match &response {
        Ok(response) => tracing::debug!(
            method = %method,
            path = %path,
            status = %response.status(),
            "gateway responded"
        ),
        Err(e) => tracing::warn!(method = %method, path = %path, error = %e, "gateway unreachable"),
    }

    Ok(response?)
}

/// Deserializes a JSON body, reporting the offending path when the `tracing` feature is on.
fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    #[cfg(feature = "tracing")]
    {
        let mut unknown = Vec::new();
        let mut on_ignored = |path: serde_ignored::Path<'_>| unknown.push(path.to_string());
        let deserializer = serde_ignored::Deserializer::new(value, &mut on_ignored);
        let decoded: std::result::Result<T, _> = serde_path_to_error::deserialize(deserializer);
        match decoded {
            Ok(decoded) => {
                if !unknown.is_empty() {
                    tracing::trace!(fields = ?unknown, "ignored unknown response fields");
                }
                Ok(decoded)
            }
            Err(e) => {
                let path = e.path().to_string();
                tracing::warn!(path = %path, error = %e.inner(), "response body did not decode");
                Err(e.into_inner().into())
            }
        }
    }

    #[cfg(not(feature = "tracing"))]
    {
        Ok(T::deserialize(value)?)
    }
}
