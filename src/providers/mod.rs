mod github;
mod google;
pub(crate) mod provider;

pub use github::GitHubProvider;
pub use google::GoogleProvider;
pub use provider::OAuthProvider;

use crate::registry::ProviderType;

impl ProviderType {
    /// Request shaping for this provider type.
    pub fn strategy(self) -> &'static dyn OAuthProvider {
        match self {
            ProviderType::Github => &GitHubProvider,
            ProviderType::Google => &GoogleProvider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_reports_its_own_type() {
        for provider_type in ProviderType::ALL {
            assert_eq!(provider_type.strategy().provider_type(), provider_type);
        }
    }
}
