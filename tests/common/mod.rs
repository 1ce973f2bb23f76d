#![allow(dead_code, reason = "shared across integration test binaries")]

use httpmock::MockServer;
use pesapal_client::order::OrderDescriptor;
use pesapal_client::{Environment, PesapalClient, PesapalConfig};
use rust_decimal_macros::dec;
use url::Url;

pub const KEY: &str = "K";
pub const SECRET: &str = "S";
pub const CHECKOUT_PATH: &str = "/API/PostPesapalDirectOrderV4";
pub const TOKEN_PATH: &str = "/Auth/RequestToken";

pub fn config(server: &MockServer) -> anyhow::Result<PesapalConfig> {
    Ok(PesapalConfig::new(Environment::Sandbox, KEY, SECRET.into())?
        .with_base_url(Url::parse(&server.base_url())?)
        .with_checkout_url(Url::parse(&server.url(CHECKOUT_PATH))?))
}

pub fn client(server: &MockServer) -> anyhow::Result<PesapalClient> {
    Ok(PesapalClient::new(config(server)?)?)
}

pub fn order() -> OrderDescriptor {
    OrderDescriptor::builder()
        .amount(dec!(100))
        .currency("UGX")
        .description("Test Order")
        .reference("1")
        .first_name("John")
        .last_name("Doe")
        .email("test@example.com")
        .build()
}
