//! Merges compiled defaults, environment variables and caller configuration
//! into the configuration a single flow step runs against.

use tracing::debug;

use crate::config::{EnvSource, WishConfig};
use crate::registry::ProviderType;
use crate::OAuthError;

/// Effective configuration for one provider key. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveProviderConfig {
    pub provider_type: ProviderType,
    pub scope_separator: String,
    pub scopes: Vec<String>,
    pub token_url: String,
    pub user_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect: Option<String>,
}

impl EffectiveProviderConfig {
    pub fn joined_scopes(&self) -> String {
        self.scopes.join(&self.scope_separator)
    }

    pub(crate) fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or_default()
    }

    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.as_deref().unwrap_or_default()
    }

    pub(crate) fn redirect(&self) -> &str {
        self.redirect.as_deref().unwrap_or_default()
    }
}

pub struct ConfigResolver {
    config: WishConfig,
    env: Box<dyn EnvSource>,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConfigResolver {
    pub fn new(config: WishConfig, env: impl EnvSource + 'static) -> Self {
        Self {
            config,
            env: Box::new(env),
        }
    }

    pub fn config(&self) -> &WishConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut WishConfig {
        &mut self.config
    }

    pub fn resolve_type(&self, key: &str) -> Result<ProviderType, OAuthError> {
        let declared = self
            .config
            .provider_settings(key)
            .and_then(|settings| settings.provider_type.as_deref());

        if let Some(declared) = declared {
            return declared
                .parse()
                .map_err(|_| OAuthError::UnsupportedProviderType {
                    key: key.to_string(),
                    provider_type: declared.to_string(),
                });
        }

        key.parse().map_err(|_| OAuthError::UnresolvableProviderKey {
            key: key.to_string(),
        })
    }

    pub fn resolve_config(&self, key: &str) -> Result<EffectiveProviderConfig, OAuthError> {
        let provider_type = self.resolve_type(key)?;
        let defaults = provider_type.defaults();
        let mut resolved = EffectiveProviderConfig {
            provider_type,
            scope_separator: defaults.scope_separator.to_string(),
            scopes: defaults.scopes.iter().map(|scope| scope.to_string()).collect(),
            token_url: defaults.token_url.to_string(),
            user_url: defaults.user_url.to_string(),
            client_id: None,
            client_secret: None,
            redirect: None,
        };

        let mapping = provider_type.env_mapping();
        for (name, slot) in [
            (mapping.client_id, &mut resolved.client_id),
            (mapping.client_secret, &mut resolved.client_secret),
            (mapping.redirect, &mut resolved.redirect),
        ] {
            if let Some(value) = self.env.var(name).filter(|value| !value.is_empty()) {
                debug!(provider = key, variable = name, "applying environment override");
                *slot = Some(value);
            }
        }

        if let Some(settings) = self.config.provider_settings(key) {
            overlay(&mut resolved.client_id, &settings.client_id);
            overlay(&mut resolved.client_secret, &settings.client_secret);
            overlay(&mut resolved.redirect, &settings.redirect);
            if let Some(scopes) = &settings.scopes {
                resolved.scopes = scopes.clone();
            }
            if let Some(separator) = &settings.scope_separator {
                resolved.scope_separator = separator.clone();
            }
            if let Some(token_url) = &settings.token_url {
                resolved.token_url = token_url.clone();
            }
            if let Some(user_url) = &settings.user_url {
                resolved.user_url = user_url.clone();
            }
        }

        Ok(resolved)
    }
}

fn overlay(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::ProviderSettings;
    use crate::registry::EnvVarMapping;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn infers_type_from_key() {
        let resolver = ConfigResolver::new(WishConfig::new(), env(&[]));
        assert_eq!(resolver.resolve_type("github").unwrap(), ProviderType::Github);
        assert_eq!(resolver.resolve_type("google").unwrap(), ProviderType::Google);
    }

    #[test]
    fn explicit_type_wins_over_key() {
        let config = WishConfig::new()
            .with_provider("work-google", ProviderSettings::new().with_type("google"))
            .with_provider("github", ProviderSettings::new().with_type("google"));
        let resolver = ConfigResolver::new(config, env(&[]));
        assert_eq!(
            resolver.resolve_type("work-google").unwrap(),
            ProviderType::Google
        );
        assert_eq!(resolver.resolve_type("github").unwrap(), ProviderType::Google);
    }

    #[test]
    fn unknown_key_is_unresolvable() {
        let config = WishConfig::new().with_provider("gitlab", ProviderSettings::new());
        let resolver = ConfigResolver::new(config, env(&[]));
        assert!(matches!(
            resolver.resolve_type("unknown"),
            Err(OAuthError::UnresolvableProviderKey { key }) if key == "unknown"
        ));
        assert!(matches!(
            resolver.resolve_type("gitlab"),
            Err(OAuthError::UnresolvableProviderKey { .. })
        ));
    }

    #[test]
    fn declared_unknown_type_is_unsupported() {
        let config =
            WishConfig::new().with_provider("corp", ProviderSettings::new().with_type("gitlab"));
        let resolver = ConfigResolver::new(config, env(&[]));
        assert!(matches!(
            resolver.resolve_config("corp"),
            Err(OAuthError::UnsupportedProviderType { provider_type, .. })
                if provider_type == "gitlab"
        ));
    }

    #[test]
    fn defaults_only() {
        let resolver = ConfigResolver::new(WishConfig::new(), env(&[]));
        let resolved = resolver.resolve_config("google").unwrap();
        assert_eq!(resolved.scope_separator, " ");
        assert_eq!(resolved.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(resolved.client_id, None);
        assert_eq!(
            resolved.joined_scopes(),
            concat!(
                "https://www.googleapis.com/auth/userinfo.profile ",
                "https://www.googleapis.com/auth/userinfo.email"
            )
        );
    }

    #[test]
    fn precedence_explicit_over_env_over_default() {
        for provider_type in ProviderType::ALL {
            let mapping = provider_type.env_mapping();
            let key = provider_type.as_str();
            let vars = env(&[
                (mapping.client_id, "env-id"),
                (mapping.client_secret, "env-secret"),
                (mapping.redirect, "https://env.example/cb"),
            ]);

            let resolver = ConfigResolver::new(WishConfig::new(), vars.clone());
            let resolved = resolver.resolve_config(key).unwrap();
            assert_eq!(resolved.client_id.as_deref(), Some("env-id"));
            assert_eq!(resolved.client_secret.as_deref(), Some("env-secret"));
            assert_eq!(resolved.redirect.as_deref(), Some("https://env.example/cb"));

            let config = WishConfig::new().with_provider(
                key,
                ProviderSettings::new()
                    .with_client_id("explicit-id")
                    .with_client_secret("explicit-secret")
                    .with_redirect("https://explicit.example/cb")
                    .with_scopes(["one", "two"]),
            );
            let resolver = ConfigResolver::new(config, vars);
            let resolved = resolver.resolve_config(key).unwrap();
            assert_eq!(resolved.client_id.as_deref(), Some("explicit-id"));
            assert_eq!(resolved.client_secret.as_deref(), Some("explicit-secret"));
            assert_eq!(resolved.redirect.as_deref(), Some("https://explicit.example/cb"));
            assert_eq!(resolved.scopes, ["one", "two"]);
            assert_eq!(resolved.token_url, provider_type.defaults().token_url);
        }
    }

    type Field = fn(&EffectiveProviderConfig) -> Option<&str>;

    fn credential_fields(mapping: &EnvVarMapping) -> [(&'static str, Field); 3] {
        [
            (mapping.client_id, |c| c.client_id.as_deref()),
            (mapping.client_secret, |c| c.client_secret.as_deref()),
            (mapping.redirect, |c| c.redirect.as_deref()),
        ]
    }

    fn explicit_only(index: usize, value: &str) -> ProviderSettings {
        let settings = ProviderSettings::new();
        match index {
            0 => settings.with_client_id(value),
            1 => settings.with_client_secret(value),
            _ => settings.with_redirect(value),
        }
    }

    #[test]
    fn each_credential_field_toggles_independently() {
        for provider_type in ProviderType::ALL {
            let key = provider_type.as_str();
            let fields = credential_fields(provider_type.env_mapping());

            for (index, (variable, field)) in fields.iter().enumerate() {
                let resolver = ConfigResolver::new(WishConfig::new(), env(&[(*variable, "env")]));
                let resolved = resolver.resolve_config(key).unwrap();
                for (other, (_, other_field)) in fields.iter().enumerate() {
                    let expected = (other == index).then_some("env");
                    assert_eq!(other_field(&resolved), expected, "{key} env {variable}");
                }

                let all_env: Vec<(&str, &str)> =
                    fields.iter().map(|(name, _)| (*name, "env")).collect();
                let config = WishConfig::new().with_provider(key, explicit_only(index, "explicit"));
                let resolver = ConfigResolver::new(config, env(&all_env));
                let resolved = resolver.resolve_config(key).unwrap();
                for (other, (_, other_field)) in fields.iter().enumerate() {
                    let expected = if other == index { "explicit" } else { "env" };
                    assert_eq!(other_field(&resolved), Some(expected), "{key} explicit {variable}");
                }
                assert_eq!(field(&resolved), Some("explicit"));
            }
        }
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let resolver = ConfigResolver::new(WishConfig::new(), env(&[("GITHUB_CLIENT_ID", "")]));
        let resolved = resolver.resolve_config("github").unwrap();
        assert_eq!(resolved.client_id, None);
    }

    #[test]
    fn env_lookup_uses_resolved_type_not_key() {
        let config =
            WishConfig::new().with_provider("work", ProviderSettings::new().with_type("google"));
        let resolver = ConfigResolver::new(
            config,
            env(&[("GOOGLE_CLIENT_ID", "g-id"), ("GITHUB_CLIENT_ID", "gh-id")]),
        );
        let resolved = resolver.resolve_config("work").unwrap();
        assert_eq!(resolved.client_id.as_deref(), Some("g-id"));
    }

    #[test]
    fn later_config_changes_apply_immediately() {
        let mut resolver = ConfigResolver::new(WishConfig::new(), env(&[]));
        assert_eq!(resolver.resolve_config("github").unwrap().client_id, None);
        resolver
            .config_mut()
            .providers
            .insert("github".to_string(), ProviderSettings::new().with_client_id("late"));
        assert_eq!(
            resolver.resolve_config("github").unwrap().client_id.as_deref(),
            Some("late")
        );
    }
}
