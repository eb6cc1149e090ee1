//! HTTP transport core for Jira Cloud and Jira Software REST API clients.
//!
//! Endpoint wrappers are thin data (a path, a parameter shape) handed to one
//! hand-written component: [`BaseClient`]. It validates the configured host,
//! serializes query parameters the way the Jira REST API expects, resolves an
//! `Authorization` header from the configured [`Authentication`], dispatches
//! exactly one HTTP request per call, and delivers the outcome either as a
//! returned `Result` or through a caller-supplied callback.
//!
//! ```no_run
//! use jira_client::{BaseClient, Config, RequestConfig};
//!
//! # async fn run() -> jira_client::Result<()> {
//! let client = BaseClient::new(
//!     Config::new("https://your-site.atlassian.net")
//!         .with_basic_auth("you@example.com", "api-token"),
//! )?;
//!
//! let issue: serde_json::Value = client
//!     .send_request(RequestConfig::get("/rest/api/3/issue/TEST-1"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod request;

pub use auth::{Authentication, TokenProvider};
pub use client::{BaseClient, ResponseEnvelope};
pub use config::{Config, Middlewares, RequestDefaults};
pub use error::{ClientError, HttpException, Result};
pub use params::{QueryParams, QueryValue};
pub use request::{Headers, RequestConfig};

pub use reqwest::Method;
