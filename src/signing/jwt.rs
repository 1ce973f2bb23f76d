#![expect(
    clippy::module_name_repetitions,
    reason = "re-exported from `signing` next to `HmacSha1Signer`"
)]

use std::fmt::Display;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::signing::encode_key;

#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JwtClaims {
    pub username: String,
}

/// Bearer-flow style signer.
///
/// [`JwtSigner::sign`] builds the sorted canonical request string but the returned value is an
/// HS256 JWT over a fixed `username` claim, so the canonical string is not covered by the
/// signature. Callers that need request integrity must use [`super::HmacSha1Signer`].
#[derive(Clone, Debug)]
pub struct JwtSigner {
    secret: SecretString,
    username: String,
}

impl JwtSigner {
    #[must_use]
    pub fn new<S: Into<String>>(secret: SecretString, username: S) -> Self {
        Self {
            secret,
            username: username.into(),
        }
    }

    /// `METHOD&ENDPOINT&k1=v1&k2=v2...`, parameters sorted by key and values percent-encoded.
    #[must_use]
    pub fn canonical_string<K, V, I>(method: &Method, endpoint: &str, params: I) -> String
    where
        K: AsRef<str>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut pairs: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_owned(), v.to_string()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut canonical = format!("{}&{endpoint}", method.as_str().to_ascii_uppercase());
        for (k, v) in &pairs {
            canonical.push('&');
            canonical.push_str(k);
            canonical.push('=');
            canonical.push_str(&encode_key(v));
        }
        canonical
    }

    /// Signed token for the configured claim.
    pub fn token(&self) -> Result<String> {
        let claims = JwtClaims {
            username: self.username.clone(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }

    pub fn sign<K, V, I>(&self, method: &Method, endpoint: &str, params: I) -> Result<String>
    where
        K: AsRef<str>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        let canonical = Self::canonical_string(method, endpoint, params);

        #[cfg(feature = "tracing")]
        tracing::trace!(canonical = %canonical, "bearer-flow canonical string (not signed)");
        #[cfg(not(feature = "tracing"))]
        drop(canonical);

        self.token()
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    use super::*;

    const ENDPOINT: &str = "https://www.pesapal.com/API/PostPesapalDirectOrderV4";

    #[test]
    fn canonical_string_sorts_by_key() {
        let a = JwtSigner::canonical_string(&Method::POST, ENDPOINT, [("b", 1), ("a", 2)]);
        let b = JwtSigner::canonical_string(&Method::POST, ENDPOINT, [("a", 2), ("b", 1)]);
        assert_eq!(a, b);
        assert_eq!(a, format!("POST&{ENDPOINT}&a=2&b=1"));
    }

    #[test]
    fn canonical_string_encodes_values_only() {
        let canonical = JwtSigner::canonical_string(
            &Method::GET,
            ENDPOINT,
            [("pesapal_request_data", "<A>1 2</A>"), ("oauth_nonce", "x/y")],
        );
        assert_eq!(
            canonical,
            format!("GET&{ENDPOINT}&oauth_nonce=x/y&pesapal_request_data=%3CA%3E1%202%3C/A%3E")
        );
    }

    #[test]
    fn canonical_string_without_params() {
        let canonical = JwtSigner::canonical_string(&Method::POST, ENDPOINT, Vec::<(&str, &str)>::new());
        assert_eq!(canonical, format!("POST&{ENDPOINT}"));
    }

    #[test]
    fn token_is_hs256_over_username_claim() {
        let signer = JwtSigner::new("secret".into(), "TECH_AIR");
        let token = signer
            .sign(&Method::POST, ENDPOINT, [("a", "1")])
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let decoded =
            decode::<JwtClaims>(&token, &DecodingKey::from_secret(b"secret"), &validation).unwrap();
        assert_eq!(decoded.claims.username, "TECH_AIR");
        assert_eq!(decoded.header.alg, Algorithm::HS256);
    }

    #[test]
    fn token_ignores_request_parameters() {
        let signer = JwtSigner::new("secret".into(), "TECH_AIR");
        let a = signer.sign(&Method::POST, ENDPOINT, [("a", "1")]).unwrap();
        let b = signer.sign(&Method::POST, ENDPOINT, [("a", "2")]).unwrap();
        assert_eq!(a, b);
    }
}
