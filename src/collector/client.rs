//! RabbitMQ management API HTTP client
//!
//! Issues Basic-authenticated GET requests against `/api/...` and returns the
//! parsed body. There is no retry here; a failed fetch waits for the next
//! round.

use reqwest::{Client, ClientBuilder};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::document::{CollectResult, ResourceDocument};
use crate::config::BrokerConfig;
use crate::error::SourceError;

/// Resource collections read from the management API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// `GET /api/overview`
    Overview,
    /// `GET /api/queues`
    Queues,
    /// `GET /api/exchanges`
    Exchanges,
    /// `GET /api/nodes/{id}`
    Node(String),
}

impl Resource {
    fn segments(&self) -> Vec<&str> {
        match self {
            Resource::Overview => vec!["overview"],
            Resource::Queues => vec!["queues"],
            Resource::Exchanges => vec!["exchanges"],
            Resource::Node(id) => vec!["nodes", id.as_str()],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Overview => write!(f, "overview"),
            Resource::Queues => write!(f, "queues"),
            Resource::Exchanges => write!(f, "exchanges"),
            Resource::Node(id) => write!(f, "nodes/{}", id),
        }
    }
}

/// Management API HTTP client
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: Url,
    auth: Option<(String, String)>,
}

impl ManagementClient {
    /// Create a client for `base_url` (e.g. "http://127.0.0.1:15672")
    ///
    /// # Example
    /// ```ignore
    /// let client = ManagementClient::new("http://127.0.0.1:15672", 5000)?
    ///     .with_auth("guest", "guest");
    /// ```
    pub fn new(base_url: &str, timeout_ms: u64) -> CollectResult<Self> {
        let invalid = |reason: String| SourceError::InvalidEndpoint {
            endpoint: base_url.to_string(),
            reason,
        };

        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(SourceError::ClientInit)?;

        Ok(Self {
            client,
            base_url,
            auth: None,
        })
    }

    /// Build a client from the broker section of the configuration
    pub fn from_config(config: &BrokerConfig) -> CollectResult<Self> {
        let base_url = format!("http://{}:{}", config.host, config.port);
        Ok(Self::new(&base_url, config.timeout_ms)?.with_auth(&config.username, &config.password))
    }

    /// Set Basic Auth credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// Full URL for `resource`, segments percent-encoded
    pub fn endpoint(&self, resource: &Resource) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("api");
            for segment in resource.segments() {
                segments.push(segment);
            }
        }
        url
    }

    /// Fetch and parse one resource collection
    #[instrument(skip(self), fields(resource = %resource))]
    pub async fn get(&self, resource: &Resource) -> CollectResult<ResourceDocument> {
        let url = self.endpoint(resource);
        debug!(url = %url, "Sending management API request");

        let mut req = self.client.get(url);

        if let Some((username, password)) = &self.auth {
            req = req.basic_auth(username, Some(password));
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;

        ResourceDocument::parse(&resource.to_string(), &body)
    }
}
