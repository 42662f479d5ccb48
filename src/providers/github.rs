use url::Url;

use crate::fetch::FetchRequest;
use crate::registry::ProviderType;
use crate::resolver::EffectiveProviderConfig;
use crate::{OAuthError, OAuthProvider, ProfileTokens};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubProvider;

impl OAuthProvider for GitHubProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Github
    }

    fn authorize_url(&self) -> &'static str {
        AUTHORIZE_URL
    }

    fn authorize_params(&self, config: &EffectiveProviderConfig) -> Vec<(String, String)> {
        vec![
            ("scope".to_string(), config.joined_scopes()),
            ("client_id".to_string(), config.client_id().to_string()),
        ]
    }

    fn token_request(
        &self,
        config: &EffectiveProviderConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<FetchRequest, OAuthError> {
        let mut url = Url::parse(&config.token_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", config.client_id());
            pairs.append_pair("client_secret", config.client_secret());
            pairs.append_pair("code", code);
            if let Some(verifier) = code_verifier {
                pairs.append_pair("code_verifier", verifier);
            }
        }
        Ok(FetchRequest::post(url).with_header("Accept", "application/json"))
    }

    fn profile_request(
        &self,
        config: &EffectiveProviderConfig,
        tokens: ProfileTokens<'_>,
    ) -> Result<FetchRequest, OAuthError> {
        let access_token = tokens.access_token()?;
        let url = Url::parse(&config.user_url)?;
        Ok(FetchRequest::get(url)
            .with_header("Authorization", format!("token {access_token}"))
            .with_header("Accept", "application/json"))
    }
}
