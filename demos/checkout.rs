//! Authenticates against PesaPal and logs the hosted checkout URL for a sample order.
//!
//! ```sh
//! PESAPAL_CONSUMER_KEY=... PESAPAL_CONSUMER_SECRET=... \
//!     RUST_LOG=info,pesapal_client=debug cargo run --example checkout --features tracing
//! ```

use pesapal_client::order::{LineItem, OrderDescriptor};
use pesapal_client::{PesapalClient, PesapalConfig};
use rust_decimal_macros::dec;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PesapalConfig::from_env()?;
    let client = PesapalClient::new(config)?;

    let result = client.authenticate().await?;
    if let Some(failure) = result.failure() {
        error!(error = %failure.error(), message = %failure.message(), "authentication failed");
        return Ok(());
    }
    let token = result.into_result()?;
    info!(expires_at = %token.expires_at(), "authenticated");

    let order = OrderDescriptor::builder()
        .amount(dec!(100))
        .currency("UGX")
        .description("Test Order")
        .reference("1")
        .first_name("John")
        .last_name("Doe")
        .email("test@example.com")
        .line_items(vec![LineItem::new("1", "Test Order", 1, dec!(100))?])
        .build();

    let response = client.initiate_checkout(&token, &order).await?;
    info!(status = %response.status_code, url = %response.iframe_url, "checkout initiated");
    info!(final_url = %response.final_url, bytes = response.body.len(), "hosted payment page fetched");

    Ok(())
}
