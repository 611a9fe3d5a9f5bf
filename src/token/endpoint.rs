use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::errors::CredentialError;

/// OAuth2 client-credentials token response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, rename = "not-before-policy")]
    pub not_before_policy: Option<i64>,
}

/// Client id/secret pair exchanged at the issuer for bearer tokens.
#[derive(Clone)]
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// `application/x-www-form-urlencoded` body for the client-credentials grant.
    pub fn form_body(&self) -> String {
        format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret),
        )
    }

    /// Performs one round trip to the token endpoint.
    ///
    /// Any non-2xx status, undecodable body, or empty `access_token` is a
    /// failure; nothing partially valid is returned.
    pub async fn exchange(&self, http: &Client) -> Result<TokenResponse, CredentialError> {
        let resp = http
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(self.form_body())
            .send()
            .await
            .map_err(CredentialError::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(CredentialError::Transport)?;
        if !status.is_success() {
            return Err(CredentialError::Rejected { status, body });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(CredentialError::Decode)?;
        if token.access_token.is_empty() {
            return Err(CredentialError::EmptyAccessToken);
        }
        debug!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "token endpoint issued access token (len={})",
            token.access_token.len()
        );
        Ok(token)
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}
