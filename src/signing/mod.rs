//! Request signing.
//!
//! Two strategies live here:
//! - [`JwtSigner`], the bearer-flow style signer: an HS256 JWT keyed by the consumer secret
//! - [`HmacSha1Signer`], the legacy OAuth 1.0 style signer the direct-order endpoint verifies
//!
//! Only the HMAC-SHA1 signature is checked by the gateway. The JWT is what the checkout
//! flow puts in `oauth_signature` before the real signature overwrites it, so it ends up
//! inside the HMAC-SHA1 base string.

mod hmac_sha1;
mod jwt;

pub use hmac_sha1::HmacSha1Signer;
pub use jwt::{JwtClaims, JwtSigner};

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Escapes everything except the RFC 3986 unreserved characters.
pub const STRICT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// [`STRICT`] with `/` left as is; used for the signing key parts and bearer-flow values.
pub const KEY: &AsciiSet = &STRICT.remove(b'/');

#[must_use]
pub fn encode_strict(input: &str) -> Cow<'_, str> {
    utf8_percent_encode(input, STRICT).into()
}

#[must_use]
pub fn encode_key(input: &str) -> Cow<'_, str> {
    utf8_percent_encode(input, KEY).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_escapes_reserved_characters() {
        assert_eq!(
            encode_strict("a b&c=d+e/f?g#h%i:j@k,l;m$n!o'p(q)r*s"),
            "a%20b%26c%3Dd%2Be%2Ff%3Fg%23h%25i%3Aj%40k%2Cl%3Bm%24n%21o%27p%28q%29r%2As"
        );
        assert_eq!(encode_strict("<Amount>100</Amount>"), "%3CAmount%3E100%3C%2FAmount%3E");
    }

    #[test]
    fn strict_keeps_unreserved_characters() {
        let unreserved = "ABCxyz019-._~";
        assert_eq!(encode_strict(unreserved), unreserved);
    }

    #[test]
    fn key_keeps_slash_only() {
        assert_eq!(encode_key("gJiE7p/Wgl+YL="), "gJiE7p/Wgl%2BYL%3D");
        assert_eq!(encode_strict("gJiE7p/Wgl+YL="), "gJiE7p%2FWgl%2BYL%3D");
    }

    #[test]
    fn non_ascii_is_utf8_escaped() {
        assert_eq!(encode_strict("café"), "caf%C3%A9");
    }
}
