//! Static knowledge about the supported provider types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    Github,
    Google,
}

impl ProviderType {
    pub const ALL: [ProviderType; 2] = [ProviderType::Github, ProviderType::Google];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::Github => "github",
            ProviderType::Google => "google",
        }
    }

    pub fn defaults(self) -> &'static ProviderDefaults {
        match self {
            ProviderType::Github => &GITHUB_DEFAULTS,
            ProviderType::Google => &GOOGLE_DEFAULTS,
        }
    }

    pub fn env_mapping(self) -> &'static EnvVarMapping {
        match self {
            ProviderType::Github => &GITHUB_ENV,
            ProviderType::Google => &GOOGLE_ENV,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported provider type `{0}`")]
pub struct UnsupportedType(pub String);

impl FromStr for ProviderType {
    type Err = UnsupportedType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProviderType::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == value)
            .ok_or_else(|| UnsupportedType(value.to_string()))
    }
}

/// Compiled-in endpoint and scope conventions for one provider type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDefaults {
    pub scope_separator: &'static str,
    pub scopes: &'static [&'static str],
    pub token_url: &'static str,
    pub user_url: &'static str,
}

/// Environment variable names that may seed credentials for one provider type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVarMapping {
    pub client_id: &'static str,
    pub client_secret: &'static str,
    pub redirect: &'static str,
}

static GITHUB_DEFAULTS: ProviderDefaults = ProviderDefaults {
    scope_separator: ",",
    scopes: &["user:email"],
    token_url: "https://github.com/login/oauth/access_token",
    user_url: "https://api.github.com/user",
};

static GOOGLE_DEFAULTS: ProviderDefaults = ProviderDefaults {
    scope_separator: " ",
    scopes: &[
        "https://www.googleapis.com/auth/userinfo.profile",
        "https://www.googleapis.com/auth/userinfo.email",
    ],
    token_url: "https://oauth2.googleapis.com/token",
    user_url: "https://www.googleapis.com/oauth2/v2/userinfo?alt=json",
};

static GITHUB_ENV: EnvVarMapping = EnvVarMapping {
    client_id: "GITHUB_CLIENT_ID",
    client_secret: "GITHUB_CLIENT_SECRET",
    redirect: "GITHUB_CALLBACK_URL",
};

static GOOGLE_ENV: EnvVarMapping = EnvVarMapping {
    client_id: "GOOGLE_CLIENT_ID",
    client_secret: "GOOGLE_CLIENT_SECRET",
    redirect: "GOOGLE_CALLBACK_URL",
};

pub fn defaults_for(provider_type: ProviderType) -> &'static ProviderDefaults {
    provider_type.defaults()
}

pub fn env_mapping_for(provider_type: ProviderType) -> &'static EnvVarMapping {
    provider_type.env_mapping()
}

pub fn is_supported_type(value: &str) -> bool {
    value.parse::<ProviderType>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types_only() {
        assert_eq!("github".parse(), Ok(ProviderType::Github));
        assert_eq!("google".parse(), Ok(ProviderType::Google));
        assert_eq!(
            "GitHub".parse::<ProviderType>(),
            Err(UnsupportedType("GitHub".to_string()))
        );
        assert!(!is_supported_type("gitlab"));
        assert!(is_supported_type("google"));
    }

    #[test]
    fn github_defaults() {
        let defaults = defaults_for(ProviderType::Github);
        assert_eq!(defaults.scope_separator, ",");
        assert_eq!(defaults.scopes, ["user:email"]);
        assert_eq!(defaults.user_url, "https://api.github.com/user");
    }

    #[test]
    fn google_env_mapping() {
        let mapping = env_mapping_for(ProviderType::Google);
        assert_eq!(mapping.client_id, "GOOGLE_CLIENT_ID");
        assert_eq!(mapping.client_secret, "GOOGLE_CLIENT_SECRET");
        assert_eq!(mapping.redirect, "GOOGLE_CALLBACK_URL");
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for provider_type in ProviderType::ALL {
            assert_eq!(provider_type.to_string().parse(), Ok(provider_type));
        }
    }
}
