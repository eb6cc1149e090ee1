use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Source of access tokens resolved at dispatch time, for setups where the
/// token is short-lived or fetched out of process.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<String>;
}

/// How outgoing requests authenticate. Resolved to an `Authorization` header
/// value before every dispatch.
#[derive(Clone)]
pub enum Authentication {
    /// Email plus API token, sent as HTTP basic credentials.
    Basic { email: String, api_token: String },
    /// OAuth 2.0 access token.
    OAuth2 { access_token: String },
    /// Personal access token (Jira Data Center).
    PersonalAccessToken { token: String },
    /// Token resolved asynchronously before every dispatch.
    Provider(Arc<dyn TokenProvider>),
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .finish_non_exhaustive(),
            Authentication::OAuth2 { .. } => f.write_str("OAuth2 { .. }"),
            Authentication::PersonalAccessToken { .. } => {
                f.write_str("PersonalAccessToken { .. }")
            }
            Authentication::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Resolve the descriptor to its `Authorization` header value.
pub(crate) async fn authentication_header(
    authentication: &Authentication,
) -> anyhow::Result<String> {
    match authentication {
        Authentication::Basic { email, api_token } => {
            let credentials = STANDARD.encode(format!("{email}:{api_token}"));
            Ok(format!("Basic {credentials}"))
        }
        Authentication::OAuth2 { access_token } => Ok(format!("Bearer {access_token}")),
        Authentication::PersonalAccessToken { token } => Ok(format!("Bearer {token}")),
        Authentication::Provider(provider) => {
            let token = provider.access_token().await?;
            Ok(format!("Bearer {token}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_credentials_encode_as_base64() {
        let auth = Authentication::Basic {
            email: "fred@example.com".into(),
            api_token: "freds-token".into(),
        };

        assert_eq!(
            authentication_header(&auth).await.unwrap(),
            "Basic ZnJlZEBleGFtcGxlLmNvbTpmcmVkcy10b2tlbg=="
        );
    }

    #[tokio::test]
    async fn test_bearer_style_descriptors() {
        let oauth = Authentication::OAuth2 {
            access_token: "abc123".into(),
        };
        assert_eq!(
            authentication_header(&oauth).await.unwrap(),
            "Bearer abc123"
        );

        let pat = Authentication::PersonalAccessToken {
            token: "pat456".into(),
        };
        assert_eq!(authentication_header(&pat).await.unwrap(), "Bearer pat456");
    }

    #[tokio::test]
    async fn test_provider_resolves_asynchronously() {
        struct Fixed;

        #[async_trait]
        impl TokenProvider for Fixed {
            async fn access_token(&self) -> anyhow::Result<String> {
                Ok("fresh".into())
            }
        }

        let auth = Authentication::Provider(Arc::new(Fixed));
        assert_eq!(authentication_header(&auth).await.unwrap(), "Bearer fresh");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        struct Broken;

        #[async_trait]
        impl TokenProvider for Broken {
            async fn access_token(&self) -> anyhow::Result<String> {
                anyhow::bail!("token endpoint unreachable")
            }
        }

        let auth = Authentication::Provider(Arc::new(Broken));
        let error = authentication_header(&auth).await.unwrap_err();
        assert!(error.to_string().contains("token endpoint unreachable"));
    }
}
