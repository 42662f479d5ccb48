//! Pluggable OAuth 2.0 authorization code grant client.
//!
//! Builds the provider's authorization redirect, redeems the returned code
//! and fetches the signed-in user's profile for GitHub and Google. Provider
//! configuration is merged from compiled defaults, environment variables and
//! caller settings. The host owns HTTP routing, sessions and state checks.

mod client;
mod config;
mod error;
mod fetch;
mod pkce;
mod providers;
mod registry;
mod resolver;
mod types;

pub use client::{OAuthClient, OAuthClientBuilder, ProviderFlow};
pub use config::{EnvSource, ProcessEnv, ProviderSettings, WishConfig};
pub use error::{NetworkError, OAuthError};
pub use fetch::{Fetch, FetchRequest, ReqwestFetcher};
pub use pkce::{DEFAULT_STATE_LENGTH, PkcePair, generate_random_string, generate_state};
pub use providers::{GitHubProvider, GoogleProvider, OAuthProvider};
pub use registry::{
    EnvVarMapping, ProviderDefaults, ProviderType, UnsupportedType, defaults_for,
    env_mapping_for, is_supported_type,
};
pub use resolver::{ConfigResolver, EffectiveProviderConfig};
pub use types::{
    AuthorizationRequest, AuthorizationResponse, ProfileTokens, TokenResponse, UserProfile,
};
