use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::auth::{Authentication, TokenProvider};
use crate::error::ClientError;
use crate::request::Headers;

pub type OnResponse = Arc<dyn Fn(&Value) + Send + Sync>;
pub type OnError = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Side-effect hooks observed around dispatch outcomes. A hook sees the exact
/// value delivered to the caller; it can neither alter nor suppress it.
#[derive(Clone, Default)]
pub struct Middlewares {
    pub on_response: Option<OnResponse>,
    pub on_error: Option<OnError>,
}

/// Construction-time configuration for [`BaseClient`](crate::BaseClient).
/// Immutable once a client is built from it.
#[derive(Clone, Default)]
pub struct Config {
    /// Base URL of the Jira site. Must be absolute, scheme included.
    pub host: String,
    pub authentication: Option<Authentication>,
    /// Value for the `x-atlassian-force-account-id` header; omitted entirely
    /// when `None`.
    pub strict_gdpr: Option<bool>,
    /// Send `X-Atlassian-Token: no-check` to bypass XSRF token verification.
    pub no_check_atlassian_token: bool,
    /// Defaults layered beneath every call.
    pub base_request_config: Option<RequestDefaults>,
    pub middlewares: Option<Middlewares>,
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    pub fn with_basic_auth(
        self,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.with_authentication(Authentication::Basic {
            email: email.into(),
            api_token: api_token.into(),
        })
    }

    pub fn with_oauth2(self, access_token: impl Into<String>) -> Self {
        self.with_authentication(Authentication::OAuth2 {
            access_token: access_token.into(),
        })
    }

    pub fn with_personal_access_token(self, token: impl Into<String>) -> Self {
        self.with_authentication(Authentication::PersonalAccessToken {
            token: token.into(),
        })
    }

    pub fn with_token_provider(self, provider: Arc<dyn TokenProvider>) -> Self {
        self.with_authentication(Authentication::Provider(provider))
    }

    pub fn with_strict_gdpr(mut self, strict: bool) -> Self {
        self.strict_gdpr = Some(strict);
        self
    }

    pub fn with_no_check_atlassian_token(mut self, bypass: bool) -> Self {
        self.no_check_atlassian_token = bypass;
        self
    }

    pub fn with_request_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.base_request_config = Some(defaults);
        self
    }

    pub fn with_on_response(mut self, hook: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.middlewares
            .get_or_insert_with(Middlewares::default)
            .on_response = Some(Arc::new(hook));
        self
    }

    pub fn with_on_error(mut self, hook: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        self.middlewares
            .get_or_insert_with(Middlewares::default)
            .on_error = Some(Arc::new(hook));
        self
    }
}

/// Per-client request defaults: headers merged beneath per-call headers, and
/// an optional client-wide timeout.
#[derive(Clone, Debug, Default)]
pub struct RequestDefaults {
    pub headers: Headers,
    pub timeout: Option<Duration>,
}

impl RequestDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
