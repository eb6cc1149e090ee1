use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

pub type Cause = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_STATUS: u16 = 500;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Couldn't parse the host URL. Perhaps you forgot to add 'http://' or 'https://' at the beginning of the URL?")]
    InvalidHostUrl {
        #[source]
        source: url::ParseError,
    },

    #[error("invalid request path `{path}`")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header `{name}`")]
    InvalidHeader { name: String },

    /// A failed call, normalized into the uniform [`HttpException`] shape.
    #[error(transparent)]
    Request(#[from] HttpException),

    /// Transport-level failure with no response attached (connect, timeout).
    /// Passed through unwrapped.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// HTTP status attached to this failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request(exception) => Some(exception.status),
            ClientError::Network(e) => e.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// The uniform error shape surfaced for every failed call.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpException {
    pub code: Option<String>,
    pub message: String,
    /// Response body payload, if the failure carried one.
    pub data: Option<Value>,
    pub status: u16,
    pub status_text: String,
    #[source]
    pub cause: Option<Cause>,
}

/// A raw failure as produced at a dispatch site, before classification.
///
/// Layers above the transport (generated endpoint code, custom token
/// providers) can funnel their own failure shapes through [`normalize`] to
/// end up with the same uniform error callers see everywhere else.
pub enum Failure {
    /// The server responded with an error status.
    Response {
        status: StatusCode,
        data: Option<Value>,
        source: Option<reqwest::Error>,
    },
    /// Transport-level failure with no response.
    Transport(reqwest::Error),
    /// A value exposing a nested `response`-shaped object.
    Envelope(Value),
    /// Any other error value.
    Error(Cause),
    /// A non-error value.
    Other(Value),
}

/// Split a `reqwest` failure on whether a response status is attached.
pub fn classify(e: reqwest::Error) -> Failure {
    match e.status() {
        Some(status) => Failure::Response {
            status,
            data: None,
            source: Some(e),
        },
        None => Failure::Transport(e),
    }
}

/// Collapse any failure into the one error shape callers see. Rules apply in
/// order, first match wins; only transport failures pass through unwrapped.
pub fn normalize(failure: Failure) -> ClientError {
    match failure {
        Failure::Response {
            status,
            data,
            source,
        } => HttpException {
            code: None,
            message: format!("Request failed with status code {}", status.as_u16()),
            data,
            status: status.as_u16(),
            status_text: canonical(status.as_u16()),
            cause: source.map(|e| Box::new(e) as Cause),
        }
        .into(),

        Failure::Transport(e) => ClientError::Network(e),

        Failure::Envelope(value) => {
            let nested = value.get("response").is_some_and(Value::is_object);
            let response = if nested {
                value["response"].clone()
            } else {
                value
            };

            let status = response
                .get("status")
                .and_then(Value::as_u64)
                .map(|status| status as u16)
                .unwrap_or(DEFAULT_STATUS);
            let status_text = response
                .get("statusText")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| canonical(status));
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Request failed with status code {status}"));

            HttpException {
                code: response
                    .get("code")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                message,
                data: response.get("data").cloned(),
                status,
                status_text,
                cause: None,
            }
            .into()
        }

        Failure::Error(e) => HttpException {
            code: None,
            message: e.to_string(),
            data: None,
            status: DEFAULT_STATUS,
            status_text: canonical(DEFAULT_STATUS),
            cause: Some(e),
        }
        .into(),

        Failure::Other(value) => HttpException {
            code: None,
            message: "Unknown error occurred.".to_owned(),
            // no error cause to chain; keep the raw value for diagnostics
            data: Some(value),
            status: DEFAULT_STATUS,
            status_text: canonical(DEFAULT_STATUS),
            cause: None,
        }
        .into(),
    }
}

fn canonical(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
        .to_owned()
}
