use serde_json::Value;
use url::Url;

use crate::fetch::FetchRequest;
use crate::providers::provider::access_token;
use crate::registry::ProviderType;
use crate::resolver::EffectiveProviderConfig;
use crate::{OAuthError, OAuthProvider, ProfileTokens, TokenResponse};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

const AUTHORIZE_PARAMS: &[(&str, &str)] = &[
    ("access_type", "offline"),
    ("response_type", "code"),
    ("prompt", "consent"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleProvider;

impl OAuthProvider for GoogleProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Google
    }

    fn authorize_url(&self) -> &'static str {
        AUTHORIZE_URL
    }

    fn authorize_params(&self, config: &EffectiveProviderConfig) -> Vec<(String, String)> {
        let mut params = vec![
            ("redirect_uri".to_string(), config.redirect().to_string()),
            ("client_id".to_string(), config.client_id().to_string()),
        ];
        params.extend(
            AUTHORIZE_PARAMS
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string())),
        );
        params.push(("scope".to_string(), config.joined_scopes()));
        params
    }

    fn token_request(
        &self,
        config: &EffectiveProviderConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<FetchRequest, OAuthError> {
        let url = Url::parse(&config.token_url)?;
        let mut form = vec![
            ("code".to_string(), code.to_string()),
            ("client_id".to_string(), config.client_id().to_string()),
            ("client_secret".to_string(), config.client_secret().to_string()),
            ("redirect_uri".to_string(), config.redirect().to_string()),
            ("grant_type".to_string(), "authorization_code".to_string()),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier".to_string(), verifier.to_string()));
        }
        Ok(FetchRequest::post(url)
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_header("Accept", "application/json")
            .with_form(form))
    }

    fn parse_token(&self, body: &Value) -> Result<TokenResponse, OAuthError> {
        Ok(TokenResponse {
            access_token: access_token(body)?,
            id_token: body
                .get("id_token")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    fn profile_request(
        &self,
        config: &EffectiveProviderConfig,
        tokens: ProfileTokens<'_>,
    ) -> Result<FetchRequest, OAuthError> {
        let access_token = tokens.access_token()?;
        let id_token = tokens.id_token()?;
        let mut url = Url::parse(&config.user_url)?;
        url.query_pairs_mut().append_pair("access_token", access_token);
        Ok(FetchRequest::get(url).with_header("Authorization", format!("Bearer {id_token}")))
    }
}
