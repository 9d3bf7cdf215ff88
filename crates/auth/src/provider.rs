//! HTTP client for the OAuth authorization server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use sitepulse_core::auth::{
    decode_state, AuthError, Identity, IdentityProvider, RawIdentity, Result, TokenResponse,
};

use crate::config::AuthConfig;

const EXCHANGE_TOKEN_PATH: &str = "/webdev.v1.WebDevAuthPublicService/ExchangeToken";
const GET_USER_INFO_PATH: &str = "/webdev.v1.WebDevAuthPublicService/GetUserInfo";
const GET_USER_INFO_WITH_JWT_PATH: &str = "/webdev.v1.WebDevAuthPublicService/GetUserInfoWithJwt";

/// Identity provider reached over HTTP.
///
/// Every call is a single JSON POST; failures surface as
/// [`AuthError::Transport`] without retries.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    app_id: String,
}

impl HttpIdentityProvider {
    /// Builds the client. An empty base URL is accepted; calls then fail
    /// at the transport layer.
    pub fn new(config: &AuthConfig) -> std::result::Result<Self, crate::AuthError> {
        let client = Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .map_err(|e| crate::AuthError::Config(format!("HTTP client: {e}")))?;

        if config.oauth_server_url.is_empty() {
            tracing::error!("Identity provider base URL is empty");
        }

        Ok(Self {
            client,
            base_url: config.oauth_server_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport)?;

        response.json::<T>().await.map_err(transport)
    }

    async fn fetch_identity(&self, path: &str, body: serde_json::Value) -> Result<Identity> {
        let raw: RawIdentity = self.post(path, &body).await?;
        Identity::try_from(raw)
    }
}

fn transport(error: reqwest::Error) -> AuthError {
    tracing::warn!(error = %error, "Identity provider request failed");
    AuthError::Transport(error.to_string())
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenResponse> {
        let redirect_uri = decode_state(state)?;
        let body = json!({
            "clientId": self.app_id,
            "grantType": "authorization_code",
            "code": code,
            "redirectUri": redirect_uri,
        });

        self.post(EXCHANGE_TOKEN_PATH, &body).await
    }

    async fn get_user_info(&self, access_token: &str) -> Result<Identity> {
        self.fetch_identity(GET_USER_INFO_PATH, json!({ "accessToken": access_token }))
            .await
    }

    async fn get_user_info_by_jwt(&self, jwt_token: &str) -> Result<Identity> {
        self.fetch_identity(
            GET_USER_INFO_WITH_JWT_PATH,
            json!({ "jwtToken": jwt_token, "projectId": self.app_id }),
        )
        .await
    }
}
