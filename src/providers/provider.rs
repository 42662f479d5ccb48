use serde_json::Value;
use url::Url;

use crate::fetch::FetchRequest;
use crate::registry::ProviderType;
use crate::resolver::EffectiveProviderConfig;
use crate::{NetworkError, OAuthError, ProfileTokens, TokenResponse};

/// Request and response shaping for one provider type.
///
/// Implementations never perform I/O; the client executes the requests they
/// describe.
pub trait OAuthProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    fn authorize_url(&self) -> &'static str;

    fn authorize_params(&self, config: &EffectiveProviderConfig) -> Vec<(String, String)>;

    fn redirect_url(
        &self,
        config: &EffectiveProviderConfig,
        extra_params: &[(String, String)],
    ) -> Result<Url, OAuthError> {
        let mut url = Url::parse(self.authorize_url())?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.authorize_params(config).iter().chain(extra_params) {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn token_request(
        &self,
        config: &EffectiveProviderConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<FetchRequest, OAuthError>;

    fn parse_token(&self, body: &Value) -> Result<TokenResponse, OAuthError> {
        Ok(TokenResponse {
            access_token: access_token(body)?,
            id_token: None,
        })
    }

    fn profile_request(
        &self,
        config: &EffectiveProviderConfig,
        tokens: ProfileTokens<'_>,
    ) -> Result<FetchRequest, OAuthError>;
}

/// Providers report a rejected code with a 200 and an `error` field, so a
/// missing `access_token` carries whatever explanation came back.
pub(crate) fn access_token(body: &Value) -> Result<String, OAuthError> {
    if let Some(token) = body.get("access_token").and_then(Value::as_str) {
        return Ok(token.to_string());
    }

    let message = match body.get("error").and_then(Value::as_str) {
        Some(error) => match body.get("error_description").and_then(Value::as_str) {
            Some(description) => format!("token request rejected: {error}: {description}"),
            None => format!("token request rejected: {error}"),
        },
        None => "token response is missing access_token".to_string(),
    };
    Err(NetworkError::invalid_response(message, body).into())
}
