#![expect(
    clippy::module_name_repetitions,
    reason = "`PesapalClient` is the crate's entry point and is re-exported at the root"
)]

use reqwest::Client as ReqwestClient;

use crate::Result;
use crate::auth::{self, AuthResult, AuthToken, Credentials};
use crate::checkout::{self, CheckoutOverrides, CheckoutResponse, SignedCheckout};
use crate::config::PesapalConfig;
use crate::order::OrderDescriptor;
use crate::signing::{HmacSha1Signer, JwtSigner};

/// PesaPal client: token authentication plus signed direct-order checkout.
#[derive(Clone, Debug)]
pub struct PesapalClient {
    config: PesapalConfig,
    credentials: Credentials,
    jwt: JwtSigner,
    hmac: HmacSha1Signer,
    client: ReqwestClient,
}

impl PesapalClient {
    /// Creates a client whose HTTP calls time out after `config.timeout`.
    pub fn new(config: PesapalConfig) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(config.timeout).build()?;
        Self::with_client(config, client)
    }

    /// Creates a client around a caller-supplied HTTP client.
    ///
    /// `config.timeout` is still applied to every request this client sends.
    pub fn with_client(config: PesapalConfig, client: ReqwestClient) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::new(&config.consumer_key, config.consumer_secret.clone());
        let jwt = JwtSigner::new(config.consumer_secret.clone(), &config.jwt_username);
        let hmac = HmacSha1Signer::new(config.consumer_secret.clone());

        Ok(Self {
            config,
            credentials,
            jwt,
            hmac,
            client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PesapalConfig {
        &self.config
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Requests a bearer token. Gateway refusals come back as [`AuthResult::Failed`].
    pub async fn authenticate(&self) -> Result<AuthResult> {
        auth::authenticate(
            &self.client,
            &self.config.base_url,
            &self.credentials,
            self.config.timeout,
        )
        .await
    }

    /// Builds and signs a checkout request without sending it.
    pub fn sign_checkout(
        &self,
        token: &AuthToken,
        order: &OrderDescriptor,
        overrides: &CheckoutOverrides,
    ) -> Result<SignedCheckout> {
        checkout::sign(
            &self.config.checkout_url,
            &self.credentials,
            &self.jwt,
            &self.hmac,
            token,
            order,
            overrides,
        )
    }

    /// Signs `order` with a fresh nonce and timestamp and fetches the hosted payment page.
    pub async fn initiate_checkout(
        &self,
        token: &AuthToken,
        order: &OrderDescriptor,
    ) -> Result<CheckoutResponse> {
        self.initiate_checkout_with_overrides(token, order, &CheckoutOverrides::default())
            .await
    }

    pub async fn initiate_checkout_with_overrides(
        &self,
        token: &AuthToken,
        order: &OrderDescriptor,
        overrides: &CheckoutOverrides,
    ) -> Result<CheckoutResponse> {
        let signed = self.sign_checkout(token, order, overrides)?;
        checkout::initiate(&self.client, &signed, self.config.timeout).await
    }

    /// Authenticates, then initiates the checkout. Authentication failures become errors.
    pub async fn checkout(&self, order: &OrderDescriptor) -> Result<CheckoutResponse> {
        let token = self.authenticate().await?.into_result()?;
        self.initiate_checkout(&token, order).await
    }
}
