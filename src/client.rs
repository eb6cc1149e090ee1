use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::auth;
use crate::config::Config;
use crate::error::{classify, normalize, ClientError, Failure, Result};
use crate::request::{Headers, RequestConfig};

const STRICT_GDPR_FLAG: &str = "x-atlassian-force-account-id";
const ATLASSIAN_TOKEN_CHECK_FLAG: &str = "X-Atlassian-Token";
const ATLASSIAN_TOKEN_CHECK_NOCHECK_VALUE: &str = "no-check";

/// The transport wrapper every endpoint function delegates to.
///
/// Holds the built HTTP client, the parsed base URL, and the configuration it
/// was constructed from. Calls against one instance are independent; nothing
/// is mutated after construction.
pub struct BaseClient {
    instance: Client,
    base_url: Url,
    config: Config,
}

/// Un-interpreted response envelope, for callers that need the status code or
/// headers rather than just the decoded payload.
#[derive(Debug)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub data: Value,
}

impl std::fmt::Debug for BaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BaseClient {
    /// Build a client from `config`. Fails fast when the host is not an
    /// absolute URL.
    pub fn new(config: Config) -> Result<Self> {
        let base_url =
            Url::parse(&config.host).map_err(|source| ClientError::InvalidHostUrl { source })?;

        let mut default_headers = Headers::new();
        if let Some(strict) = config.strict_gdpr {
            default_headers = default_headers.set(STRICT_GDPR_FLAG, strict.to_string());
        }
        if config.no_check_atlassian_token {
            default_headers =
                default_headers.set(ATLASSIAN_TOKEN_CHECK_FLAG, ATLASSIAN_TOKEN_CHECK_NOCHECK_VALUE);
        }
        if let Some(defaults) = &config.base_request_config {
            default_headers = default_headers.merge(&defaults.headers);
        }

        let mut builder = Client::builder()
            .user_agent(format!("jira-client/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers.to_header_map()?);
        if let Some(timeout) = config
            .base_request_config
            .as_ref()
            .and_then(|defaults| defaults.timeout)
        {
            builder = builder.timeout(timeout);
        }
        let instance = builder.build().map_err(ClientError::Network)?;

        Ok(Self {
            instance,
            base_url,
            config,
        })
    }

    /// Dispatch `request` and return the decoded payload.
    ///
    /// Exactly one of a value or an error is produced per call. The
    /// `on_response` middleware observes the raw payload on success; the
    /// `on_error` middleware observes the normalized error on failure.
    pub async fn send_request<T: DeserializeOwned>(&self, request: RequestConfig) -> Result<T> {
        self.dispatch(request).await
    }

    /// Same dispatch as [`send_request`](Self::send_request), with the
    /// outcome handed to `callback` instead of returned.
    pub async fn send_request_with_callback<T, F>(&self, request: RequestConfig, callback: F)
    where
        T: DeserializeOwned,
        F: FnOnce(Result<T>),
    {
        callback(self.dispatch(request).await);
    }

    /// Dispatch `request` and return the raw envelope. No middleware runs on
    /// this path and it has no callback variant.
    pub async fn send_request_full_response(
        &self,
        request: RequestConfig,
    ) -> Result<ResponseEnvelope> {
        let authorization = match &self.config.authentication {
            Some(authentication) => Some(
                auth::authentication_header(authentication)
                    .await
                    .map_err(|e| normalize(Failure::Error(e.into())))?,
            ),
            None => None,
        };

        let mut headers = Headers::new();
        if let Some(authorization) = authorization {
            headers = headers.set("Authorization", authorization);
        }
        let headers = headers.merge(&request.headers).to_header_map()?;

        let url = self.request_url(&request)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut outgoing = self
            .instance
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            outgoing = outgoing.json(body);
        }

        let response = outgoing.send().await.map_err(|e| normalize(classify(e)))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_owned();
        let response_headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(|e| normalize(classify(e)))?;

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) if status.is_success() => {
                    error!(error = %e, "Failed to parse JSON response");
                    return Err(normalize(Failure::Error(Box::new(e))));
                }
                // error pages are not always JSON; keep the text as payload
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        if !status.is_success() {
            return Err(normalize(Failure::Response {
                status,
                data: Some(data),
                source: None,
            }));
        }

        Ok(ResponseEnvelope {
            status,
            status_text,
            headers: response_headers,
            data,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_request(RequestConfig::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.send_request(RequestConfig::post(path).body(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.send_request(RequestConfig::put(path).body(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_request(RequestConfig::delete(path)).await
    }

    /// One dispatch shared by both calling conventions; runs the lifecycle
    /// middlewares on the exact value delivered to the caller.
    async fn dispatch<T: DeserializeOwned>(&self, request: RequestConfig) -> Result<T> {
        let outcome = self.decoded(request).await;
        let middlewares = self.config.middlewares.as_ref();

        match outcome {
            Ok((data, decoded)) => {
                if let Some(on_response) = middlewares.and_then(|m| m.on_response.as_ref()) {
                    on_response(&data);
                }
                Ok(decoded)
            }
            Err(err) => {
                if let Some(on_error) = middlewares.and_then(|m| m.on_error.as_ref()) {
                    on_error(&err);
                }
                Err(err)
            }
        }
    }

    async fn decoded<T: DeserializeOwned>(&self, request: RequestConfig) -> Result<(Value, T)> {
        let envelope = self.send_request_full_response(request).await?;
        let decoded = T::deserialize(&envelope.data).map_err(|e| {
            error!(error = %e, "Failed to decode response payload");
            normalize(Failure::Error(Box::new(e)))
        })?;
        Ok((envelope.data, decoded))
    }

    fn request_url(&self, request: &RequestConfig) -> Result<Url> {
        let path = request.url.strip_prefix('/').unwrap_or(&request.url);
        let mut url = self
            .base_url
            .join(path)
            .map_err(|source| ClientError::InvalidPath {
                path: request.url.clone(),
                source,
            })?;

        let query = request.params.to_query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_without_scheme_fails_fast() {
        let error = BaseClient::new(Config::new("example.atlassian.net")).unwrap_err();

        assert!(matches!(error, ClientError::InvalidHostUrl { .. }));
        assert!(error.to_string().contains("'http://' or 'https://'"));
    }

    #[test]
    fn test_absolute_host_accepted() {
        assert!(BaseClient::new(Config::new("https://example.atlassian.net")).is_ok());
    }

    #[test]
    fn test_request_url_joins_path_and_query() {
        let client = BaseClient::new(Config::new("https://example.atlassian.net")).unwrap();
        let request = RequestConfig::get("/rest/api/3/search")
            .param("jql", "project = TEST")
            .param("fields", vec!["summary", "status"]);

        let url = client.request_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.atlassian.net/rest/api/3/search?jql=project+%3D+TEST&fields=summary,status"
        );
    }

    #[test]
    fn test_request_url_without_params_has_no_query() {
        let client = BaseClient::new(Config::new("https://example.atlassian.net")).unwrap();
        let request = RequestConfig::get("/rest/api/3/myself");

        let url = client.request_url(&request).unwrap();
        assert_eq!(url.as_str(), "https://example.atlassian.net/rest/api/3/myself");
        assert!(url.query().is_none());
    }
}
