// Account endpoints
//
// The login exchange is sent anonymously; a rejected login is reported as
// `LoginRejected` and never expires an existing session.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{FarmerResponse, LoginRequest, RegisterRequest, TokenResponse};

impl ApiClient {
    /// Exchange credentials for a bearer token and adopt it in the session.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<TokenResponse, Error> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let resp = self.post_anonymous("auth/login", &body).await?;
        let token: TokenResponse = self.handle_anonymous_response(resp).await?;

        self.session()
            .sign_in(SecretString::from(token.access_token.clone()))?;
        debug!(token_type = %token.token_type, "login successful");
        Ok(token)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<FarmerResponse, Error> {
        let resp = self.post_anonymous("auth/register", request).await?;
        self.handle_anonymous_response(resp).await
    }

    /// The farmer the current token belongs to.
    pub async fn me(&self) -> Result<FarmerResponse, Error> {
        self.get("auth/me").await
    }
}
