use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("`{key}` is not a configured provider and does not name a supported provider type")]
    UnresolvableProviderKey { key: String },

    #[error(
        "provider `{key}` declares unsupported type `{provider_type}` (supported: github, google)"
    )]
    UnsupportedProviderType { key: String, provider_type: String },

    #[error("no provider selected and no default provider configured")]
    NoProviderSelected,

    #[error("authorization code is missing or empty")]
    InvalidCode,

    #[error("access token is missing or empty")]
    InvalidAccessToken,

    #[error("id token is missing or empty")]
    InvalidIdToken,

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("os rng error: {message}")]
    OsRng { message: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures talking to a provider endpoint. Surfaced unchanged, never retried.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String, body: String },

    #[error("invalid header: {name}={value}")]
    InvalidHeader { name: String, value: String },
}

impl NetworkError {
    pub(crate) fn invalid_response(message: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            body: body.to_string(),
        }
    }
}
