use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::{EnvSource, ProcessEnv, WishConfig};
use crate::fetch::{Fetch, ReqwestFetcher};
use crate::pkce::generate_state;
use crate::resolver::{ConfigResolver, EffectiveProviderConfig};
use crate::{
    AuthorizationRequest, AuthorizationResponse, NetworkError, OAuthError, OAuthProvider,
    PkcePair, ProfileTokens, TokenResponse, UserProfile,
};

pub struct OAuthClientBuilder {
    config: WishConfig,
    env: Box<dyn EnvSource>,
    timeout: Option<Duration>,
}

impl OAuthClientBuilder {
    pub fn new(config: WishConfig) -> Self {
        Self {
            config,
            env: Box::new(ProcessEnv),
            timeout: None,
        }
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OAuthClient, OAuthError> {
        let fetcher = ReqwestFetcher::new(self.timeout)?;
        Ok(self.build_with_fetcher(fetcher))
    }

    pub fn build_with_fetcher<F: Fetch>(self, fetcher: F) -> OAuthClient<F> {
        OAuthClient::with_fetcher(ConfigResolver::new(self.config, self.env), fetcher)
    }
}

/// Authorization code grant client for the configured providers.
///
/// Every flow step has an explicit form taking the provider key
/// (`*_for`). [`OAuthClient::flow`] binds a key for the duration of one
/// request; [`OAuthClient::select_provider`] and the unsuffixed methods are
/// shorthand over the same operations for single-provider hosts.
#[derive(Debug)]
pub struct OAuthClient<F: Fetch = ReqwestFetcher> {
    resolver: ConfigResolver,
    fetcher: F,
    active_provider: Option<String>,
}

impl OAuthClient<ReqwestFetcher> {
    /// Client reading the environment tier from the process environment.
    pub fn new(config: WishConfig) -> Result<Self, OAuthError> {
        OAuthClientBuilder::new(config).build()
    }

    pub fn builder(config: WishConfig) -> OAuthClientBuilder {
        OAuthClientBuilder::new(config)
    }
}

impl<F: Fetch> OAuthClient<F> {
    pub fn with_fetcher(resolver: ConfigResolver, fetcher: F) -> Self {
        info!(
            providers = resolver.config().providers.len(),
            default_provider = resolver.config().provider.as_deref().unwrap_or("none"),
            "initializing oauth client"
        );
        Self {
            resolver,
            fetcher,
            active_provider: None,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    pub fn config(&self) -> &WishConfig {
        self.resolver.config()
    }

    pub fn config_mut(&mut self) -> &mut WishConfig {
        self.resolver.config_mut()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn select_provider(&mut self, key: impl Into<String>) -> Result<&mut Self, OAuthError> {
        let key = key.into();
        let provider_type = self.resolver.resolve_type(&key)?;
        info!(provider = %key, %provider_type, "selected oauth provider");
        self.active_provider = Some(key);
        Ok(self)
    }

    pub fn current_provider_key(&self) -> Result<&str, OAuthError> {
        self.active_provider
            .as_deref()
            .or(self.resolver.config().provider.as_deref())
            .ok_or(OAuthError::NoProviderSelected)
    }

    pub fn flow(&self, key: impl Into<String>) -> Result<ProviderFlow<'_, F>, OAuthError> {
        let key = key.into();
        self.resolver.resolve_type(&key)?;
        Ok(ProviderFlow { client: self, key })
    }

    pub fn current_flow(&self) -> Result<ProviderFlow<'_, F>, OAuthError> {
        self.flow(self.current_provider_key()?)
    }

    fn resolve(
        &self,
        key: &str,
    ) -> Result<(EffectiveProviderConfig, &'static dyn OAuthProvider), OAuthError> {
        let config = self.resolver.resolve_config(key)?;
        let provider = config.provider_type.strategy();
        Ok((config, provider))
    }

    pub fn redirect_url_for(&self, key: &str) -> Result<String, OAuthError> {
        let (config, provider) = self.resolve(key)?;
        Ok(provider.redirect_url(&config, &[])?.to_string())
    }

    /// Redirect URL carrying a fresh `state` and, when `use_pkce` is set, an
    /// S256 code challenge. Persist the returned state and verifier; checking
    /// them on the way back is up to the caller.
    pub fn authorization_request_for(
        &self,
        key: &str,
        use_pkce: bool,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let (config, provider) = self.resolve(key)?;
        let state = generate_state();
        let pkce = if use_pkce {
            Some(PkcePair::generate()?)
        } else {
            None
        };

        let mut extra = vec![("state".to_string(), state.clone())];
        if let Some(pkce) = &pkce {
            extra.push(("code_challenge".to_string(), pkce.code_challenge.clone()));
            extra.push(("code_challenge_method".to_string(), "S256".to_string()));
        }

        Ok(AuthorizationRequest {
            authorization_url: provider.redirect_url(&config, &extra)?.to_string(),
            pkce,
            state,
        })
    }

    pub async fn exchange_code_for(
        &self,
        key: &str,
        code: &str,
    ) -> Result<TokenResponse, OAuthError> {
        self.exchange_code_with_verifier_for(key, code, None).await
    }

    pub async fn exchange_code_with_verifier_for(
        &self,
        key: &str,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse, OAuthError> {
        if code.is_empty() {
            return Err(OAuthError::InvalidCode);
        }

        let (config, provider) = self.resolve(key)?;
        let request = provider.token_request(&config, code, code_verifier)?;
        debug!(provider = key, "exchanging authorization code");
        let body = self.fetcher.fetch_json(request).await?;
        provider.parse_token(&body)
    }

    pub async fn fetch_user_profile_for(
        &self,
        key: &str,
        tokens: ProfileTokens<'_>,
    ) -> Result<UserProfile, OAuthError> {
        tokens.access_token()?;

        let (config, provider) = self.resolve(key)?;
        let request = provider.profile_request(&config, tokens)?;
        debug!(provider = key, "fetching user profile");
        match self.fetcher.fetch_json(request).await? {
            Value::Object(fields) => Ok(UserProfile::new(fields)),
            other => Err(NetworkError::invalid_response(
                "user profile response is not a json object",
                &other,
            )
            .into()),
        }
    }

    pub async fn complete_authorization_for(
        &self,
        key: &str,
        code: &str,
    ) -> Result<UserProfile, OAuthError> {
        self.complete_authorization_with_verifier_for(key, code, None)
            .await
    }

    pub async fn complete_authorization_with_verifier_for(
        &self,
        key: &str,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<UserProfile, OAuthError> {
        let tokens = self
            .exchange_code_with_verifier_for(key, code, code_verifier)
            .await?;
        let profile = self
            .fetch_user_profile_for(key, ProfileTokens::from(&tokens))
            .await?;
        Ok(profile.with_tokens(tokens))
    }

    /// Completes the flow straight from the URL the provider redirected to.
    pub async fn complete_authorization_from_url_for(
        &self,
        key: &str,
        callback_url: &str,
        code_verifier: Option<&str>,
    ) -> Result<UserProfile, OAuthError> {
        let response = AuthorizationResponse::from_url(callback_url)?;
        self.complete_authorization_with_verifier_for(key, &response.code, code_verifier)
            .await
    }

    pub fn redirect_url(&self) -> Result<String, OAuthError> {
        self.current_flow()?.redirect_url()
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        self.current_flow()?.exchange_code(code).await
    }

    pub async fn fetch_user_profile(
        &self,
        tokens: ProfileTokens<'_>,
    ) -> Result<UserProfile, OAuthError> {
        self.current_flow()?.fetch_user_profile(tokens).await
    }

    pub async fn complete_authorization(&self, code: &str) -> Result<UserProfile, OAuthError> {
        self.current_flow()?.complete_authorization(code).await
    }

    /// Alias for [`OAuthClient::complete_authorization`].
    pub async fn user(&self, code: &str) -> Result<UserProfile, OAuthError> {
        self.complete_authorization(code).await
    }
}

/// A client bound to one provider key.
#[derive(Debug)]
pub struct ProviderFlow<'a, F: Fetch = ReqwestFetcher> {
    client: &'a OAuthClient<F>,
    key: String,
}

impl<F: Fetch> ProviderFlow<'_, F> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resolved_config(&self) -> Result<EffectiveProviderConfig, OAuthError> {
        self.client.resolver.resolve_config(&self.key)
    }

    pub fn redirect_url(&self) -> Result<String, OAuthError> {
        self.client.redirect_url_for(&self.key)
    }

    pub fn authorization_request(
        &self,
        use_pkce: bool,
    ) -> Result<AuthorizationRequest, OAuthError> {
        self.client.authorization_request_for(&self.key, use_pkce)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        self.client.exchange_code_for(&self.key, code).await
    }

    pub async fn exchange_code_with_verifier(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, OAuthError> {
        self.client
            .exchange_code_with_verifier_for(&self.key, code, Some(code_verifier))
            .await
    }

    pub async fn fetch_user_profile(
        &self,
        tokens: ProfileTokens<'_>,
    ) -> Result<UserProfile, OAuthError> {
        self.client.fetch_user_profile_for(&self.key, tokens).await
    }

    pub async fn complete_authorization(&self, code: &str) -> Result<UserProfile, OAuthError> {
        self.client.complete_authorization_for(&self.key, code).await
    }

    pub async fn complete_authorization_with_verifier(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<UserProfile, OAuthError> {
        self.client
            .complete_authorization_with_verifier_for(&self.key, code, Some(code_verifier))
            .await
    }

    pub async fn complete_authorization_from_url(
        &self,
        callback_url: &str,
        code_verifier: Option<&str>,
    ) -> Result<UserProfile, OAuthError> {
        self.client
            .complete_authorization_from_url_for(&self.key, callback_url, code_verifier)
            .await
    }
}
