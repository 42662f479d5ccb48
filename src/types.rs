use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::{OAuthError, PkcePair};

/// Redirect URL bundled with the values the caller must persist until the
/// provider sends the user back.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub pkce: Option<PkcePair>,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: Option<String>,
}

impl AuthorizationResponse {
    pub fn from_url(callback_url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(callback_url)?;
        let mut code = None;
        let mut state = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.to_string()),
                "state" => state = Some(value.to_string()),
                _ => {}
            }
        }

        let code = code
            .filter(|code| !code.is_empty())
            .ok_or(OAuthError::InvalidCode)?;
        Ok(Self { code, state })
    }
}

/// Result of redeeming an authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Tokens presented to the user-info endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileTokens<'a> {
    pub access_token: Option<&'a str>,
    pub id_token: Option<&'a str>,
}

impl<'a> ProfileTokens<'a> {
    pub fn new(access_token: &'a str) -> Self {
        Self {
            access_token: Some(access_token),
            id_token: None,
        }
    }

    pub fn with_id_token(mut self, id_token: &'a str) -> Self {
        self.id_token = Some(id_token);
        self
    }

    pub(crate) fn access_token(&self) -> Result<&'a str, OAuthError> {
        self.access_token
            .filter(|token| !token.is_empty())
            .ok_or(OAuthError::InvalidAccessToken)
    }

    pub(crate) fn id_token(&self) -> Result<&'a str, OAuthError> {
        self.id_token
            .filter(|token| !token.is_empty())
            .ok_or(OAuthError::InvalidIdToken)
    }
}

impl<'a> From<&'a TokenResponse> for ProfileTokens<'a> {
    fn from(tokens: &'a TokenResponse) -> Self {
        Self {
            access_token: Some(&tokens.access_token),
            id_token: tokens.id_token.as_deref(),
        }
    }
}

/// The provider's user-info payload, passed through as-is. Tokens are
/// attached only by the completing step and serialize as `accessToken` and
/// `idToken` alongside the provider's own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            access_token: None,
            id_token: None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub(crate) fn with_tokens(mut self, tokens: TokenResponse) -> Self {
        self.access_token = Some(tokens.access_token);
        self.id_token = tokens.id_token;
        self
    }

    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        if let Some(token) = self.access_token {
            fields.insert("accessToken".to_string(), Value::String(token));
        }
        if let Some(token) = self.id_token {
            fields.insert("idToken".to_string(), Value::String(token));
        }
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_url_parses_query_params() {
        let response =
            AuthorizationResponse::from_url("http://localhost/callback?code=abc123&state=state456")
                .unwrap();
        assert_eq!(response.code, "abc123");
        assert_eq!(response.state.as_deref(), Some("state456"));
    }

    #[test]
    fn from_url_requires_code() {
        for url in [
            "http://localhost/callback?state=state456",
            "http://localhost/callback?code=&state=state456",
        ] {
            let result = AuthorizationResponse::from_url(url);
            assert!(matches!(result, Err(OAuthError::InvalidCode)));
        }
    }

    #[test]
    fn profile_serializes_with_attached_tokens() {
        let fields = json!({"login": "octocat", "id": 1})
            .as_object()
            .cloned()
            .unwrap();
        let profile = UserProfile::new(fields).with_tokens(TokenResponse {
            access_token: "tok".to_string(),
            id_token: None,
        });

        let expected = json!({"login": "octocat", "id": 1, "accessToken": "tok"});
        assert_eq!(serde_json::to_value(&profile).unwrap(), expected);
        assert_eq!(profile.into_value(), expected);
    }

    #[test]
    fn empty_tokens_are_rejected() {
        assert!(matches!(
            ProfileTokens::new("").access_token(),
            Err(OAuthError::InvalidAccessToken)
        ));
        assert!(matches!(
            ProfileTokens::default().access_token(),
            Err(OAuthError::InvalidAccessToken)
        ));
        assert!(matches!(
            ProfileTokens::new("x").with_id_token("").id_token(),
            Err(OAuthError::InvalidIdToken)
        ));
    }
}
