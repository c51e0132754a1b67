//! Birdeye dashboard login.

use async_trait::async_trait;
use keygauge_core::Credential;
use keygauge_fetch::{FetchContext, FetchError, SessionLogin, endpoint};
use serde::Serialize;
use tracing::{debug, instrument};

use super::adapter::dashboard_headers;
use super::parser::LoginResponse;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Splits an `email:password` credential at the first colon.
///
/// # Errors
///
/// Returns [`FetchError::AuthenticationFailed`] if either half is missing.
pub fn split_login(credential: &Credential) -> Result<(&str, &str), FetchError> {
    credential
        .expose()
        .split_once(':')
        .filter(|(email, password)| !email.is_empty() && !password.is_empty())
        .ok_or_else(|| {
            FetchError::AuthenticationFailed("expected an `email:password` credential".to_string())
        })
}

/// Logs into the Birdeye dashboard API with email and password.
#[derive(Debug, Clone)]
pub struct BirdeyeLogin {
    base_url: String,
}

impl BirdeyeLogin {
    /// Creates a login step against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SessionLogin for BirdeyeLogin {
    #[instrument(skip_all, fields(key = %credential))]
    async fn login(&self, ctx: &FetchContext, credential: &Credential) -> Result<String, FetchError> {
        let (email, password) = split_login(credential)?;
        let url = endpoint(&self.base_url, "user/login")?;

        let response: LoginResponse = ctx
            .http
            .post_json(url.as_str(), dashboard_headers(None)?, &LoginRequest { email, password })
            .await
            .map_err(|e| match e {
                FetchError::AuthenticationFailed(msg) => FetchError::Login(msg),
                other => other,
            })?;

        let token = response.into_token()?;
        debug!("Session token issued");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_login() {
        let credential = Credential::new("ops@example.com:pa:ss");
        assert_eq!(split_login(&credential).unwrap(), ("ops@example.com", "pa:ss"));
    }

    #[test]
    fn test_split_login_rejects_bare_key() {
        assert!(split_login(&Credential::new("just-an-api-key")).is_err());
        assert!(split_login(&Credential::new("ops@example.com:")).is_err());
    }
}
