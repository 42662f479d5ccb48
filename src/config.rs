use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::OAuthError;

/// Caller-supplied configuration: the highest precedence tier.
///
/// ```toml
/// provider = "github"
///
/// [providers.github]
/// clientId = "abc"
/// clientSecret = "def"
///
/// [providers.work-google]
/// type = "google"
/// redirect = "https://example.com/auth/google/callback"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishConfig {
    /// Provider key used when nothing has been selected explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl WishConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, OAuthError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OAuthError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_default_provider(mut self, key: impl Into<String>) -> Self {
        self.provider = Some(key.into());
        self
    }

    pub fn with_provider(mut self, key: impl Into<String>, settings: ProviderSettings) -> Self {
        self.providers.insert(key.into(), settings);
        self
    }

    pub fn provider_settings(&self, key: &str) -> Option<&ProviderSettings> {
        self.providers.get(key)
    }
}

/// Per-key overrides. Every field that is present wins over the
/// environment and the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_url: Option<String>,
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = Some(token_url.into());
        self
    }

    pub fn with_user_url(mut self, user_url: impl Into<String>) -> Self {
        self.user_url = Some(user_url.into());
        self
    }
}

/// Source for the environment tier.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for Box<dyn EnvSource> {
    fn var(&self, name: &str) -> Option<String> {
        self.as_ref().var(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_toml() {
        let config = WishConfig::from_toml_str(
            r#"
            provider = "work-google"

            [providers.github]
            clientId = "abc"
            clientSecret = "def"
            scopes = ["user:email", "read:org"]

            [providers.work-google]
            type = "google"
            redirect = "https://example.com/cb"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.as_deref(), Some("work-google"));
        let github = config.provider_settings("github").unwrap();
        assert_eq!(github.client_id.as_deref(), Some("abc"));
        assert_eq!(
            github.scopes.as_deref(),
            Some(&["user:email".to_string(), "read:org".to_string()][..])
        );
        let google = config.provider_settings("work-google").unwrap();
        assert_eq!(google.provider_type.as_deref(), Some("google"));
        assert_eq!(google.client_id, None);
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = WishConfig::from_toml_str("providers = 3");
        assert!(matches!(result, Err(OAuthError::Config(_))));
    }

    #[test]
    fn builder_matches_parsed_config() {
        let built = WishConfig::new().with_provider(
            "github",
            ProviderSettings::new()
                .with_client_id("abc")
                .with_client_secret("def"),
        );
        let parsed = WishConfig::from_toml_str(
            "[providers.github]\nclientId = \"abc\"\nclientSecret = \"def\"\n",
        )
        .unwrap();
        assert_eq!(built, parsed);
    }
}
