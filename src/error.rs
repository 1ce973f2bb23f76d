use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Coarse category of an [`Error`], used by callers to branch without downcasting.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The gateway could not be reached (connect, TLS, timeout, body read).
    Transport,
    /// The token endpoint answered 200 but reported a non-success status.
    Authentication,
    /// The token endpoint answered with an HTTP status other than 200.
    UnexpectedResponse,
    /// The checkout endpoint answered with a non-2xx status.
    CheckoutInitiationFailed,
    /// Invalid configuration or caller input.
    Validation,
    /// Signing or serialization of an outgoing request failed.
    Encoding,
    /// A successful response body did not have the documented shape.
    Decode,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    #[must_use]
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    #[must_use]
    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Validation {
            reason: reason.into(),
        }
        .into()
    }

    #[must_use]
    pub fn encoding<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Encoding,
            Validation {
                reason: reason.into(),
            },
        )
    }

    #[must_use]
    pub fn decode<S: Into<String>>(reason: S) -> Self {
        Self::with_source(
            Kind::Decode,
            Validation {
                reason: reason.into(),
            },
        )
    }

    #[must_use]
    pub fn authentication<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        GatewayFailure {
            code: code.into(),
            message: message.into(),
        }
        .into()
    }

    #[must_use]
    pub fn unexpected_response(status_code: StatusCode) -> Self {
        UnexpectedStatus { status_code }.into()
    }

    #[must_use]
    pub fn checkout_failed<B: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        body: B,
    ) -> Self {
        CheckoutFailure {
            status_code,
            method,
            path,
            body: body.into(),
        }
        .into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Error object returned in the token endpoint body when `status != "200"`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayFailure {
    pub code: String,
    pub message: String,
}

impl fmt::Display for GatewayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gateway rejected credentials ({}): {}", self.code, self.message)
    }
}

impl StdError for GatewayFailure {}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnexpectedStatus {
    pub status_code: StatusCode,
}

impl fmt::Display for UnexpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid server response: {}", self.status_code)
    }
}

impl StdError for UnexpectedStatus {}

#[non_exhaustive]
#[derive(Debug)]
pub struct CheckoutFailure {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub body: String,
}

impl fmt::Display for CheckoutFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.body
        )
    }
}

impl StdError for CheckoutFailure {}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Validation> for Error {
    fn from(e: Validation) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<GatewayFailure> for Error {
    fn from(e: GatewayFailure) -> Self {
        Error::with_source(Kind::Authentication, e)
    }
}

impl From<UnexpectedStatus> for Error {
    fn from(e: UnexpectedStatus) -> Self {
        Error::with_source(Kind::UnexpectedResponse, e)
    }
}

impl From<CheckoutFailure> for Error {
    fn from(e: CheckoutFailure) -> Self {
        Error::with_source(Kind::CheckoutInitiationFailed, e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::with_source(Kind::Internal, e)
        } else if e.is_decode() {
            Error::with_source(Kind::Decode, e)
        } else {
            Error::with_source(Kind::Transport, e)
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Decode, e)
    }
}

impl From<quick_xml::SeError> for Error {
    fn from(e: quick_xml::SeError) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_payload_type() {
        let err = Error::authentication("invalid_consumer_key", "Invalid consumer key");
        assert_eq!(err.kind(), Kind::Authentication);
        let failure = err.downcast_ref::<GatewayFailure>().expect("gateway failure");
        assert_eq!(failure.code, "invalid_consumer_key");

        let err = Error::unexpected_response(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), Kind::UnexpectedResponse);
        assert_eq!(
            err.to_string(),
            "UnexpectedResponse: invalid server response: 500 Internal Server Error"
        );
    }

    #[test]
    fn checkout_failure_keeps_status_and_body() {
        let err = Error::checkout_failed(
            StatusCode::BAD_REQUEST,
            Method::GET,
            "/API/PostPesapalDirectOrderV4".to_owned(),
            "Problem: signature_invalid",
        );
        assert_eq!(err.kind(), Kind::CheckoutInitiationFailed);
        let failure = err.downcast_ref::<CheckoutFailure>().expect("checkout failure");
        assert_eq!(failure.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(failure.body, "Problem: signature_invalid");
    }
}
