//! Repository client and catalog sync

use crate::error::{RepositoryError, Result};
use crate::{CLIENT_VERSION_HEADER, VERSION};
use plugvault_cache::BulkUpdate;
use plugvault_core::types::{NetworkConfig, RepositoryConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Response, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Client for the plugin repository HTTP API
pub struct RepositoryClient {
    /// HTTP client
    pub(crate) http: reqwest::Client,

    /// `<base_url>/<api_path>/`, always ending in a slash
    api_base: Url,

    /// Timeout applied to each plugin file download, overriding the
    /// client-wide request timeout
    pub(crate) download_timeout: Duration,

    /// Set once the server rejects this client version
    too_old: AtomicBool,

    /// Token of the submission currently waiting for its image
    pub(crate) pending_upload: Mutex<Option<String>>,
}

impl RepositoryClient {
    /// Create a client from configuration
    pub fn new(repository: &RepositoryConfig, network: &NetworkConfig) -> Result<Self> {
        let api_base = api_base(&repository.base_url, &repository.api_path)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CLIENT_VERSION_HEADER),
            HeaderValue::from_static(VERSION),
        );

        let mut builder = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(network.http_timeout_secs));

        if network.accept_invalid_certs {
            warn!(
                "TLS certificate validation is disabled for {}; connections can be intercepted",
                api_base
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build()?;
        debug!("Repository client targeting {}", api_base);

        Ok(Self {
            http,
            api_base,
            download_timeout: Duration::from_secs(network.download_timeout_secs),
            too_old: AtomicBool::new(false),
            pending_upload: Mutex::new(None),
        })
    }

    /// Base URL every endpoint is resolved against
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Whether the server has rejected this client version
    pub fn is_too_old(&self) -> bool {
        self.too_old.load(Ordering::SeqCst)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }

    /// Fail fast once the version gate has tripped
    pub(crate) fn check_gate(&self) -> Result<()> {
        if self.is_too_old() {
            return Err(RepositoryError::ClientTooOld);
        }
        Ok(())
    }

    /// Map a response status onto the error taxonomy
    pub(crate) fn classify(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UPGRADE_REQUIRED => {
                if !self.too_old.swap(true, Ordering::SeqCst) {
                    warn!("Plugin repository requires a newer client than {}", VERSION);
                }
                Err(RepositoryError::ClientTooOld)
            }
            status => {
                debug!("{} answered HTTP {}", response.url(), status);
                Err(RepositoryError::Unavailable {
                    status: status.as_u16(),
                })
            }
        }
    }

    /// Download the catalog schema (DDL text)
    pub async fn fetch_schema(&self) -> Result<String> {
        self.check_gate()?;
        let url = self.endpoint("schema")?;
        debug!("Fetching catalog schema from {}", url);

        let response = self.http.get(url).send().await?;
        let schema = self.classify(response)?.text().await?;
        Ok(schema)
    }

    /// Download the catalog tables
    pub async fn fetch_catalog_tables(&self) -> Result<BulkUpdate> {
        self.check_gate()?;
        let url = self.endpoint("tables")?;
        debug!("Fetching catalog tables from {}", url);

        let response = self.http.get(url).send().await?;
        let body = self.classify(response)?.text().await?;
        let update = BulkUpdate::from_json(&body)
            .map_err(|e| RepositoryError::malformed(format!("catalog tables: {}", e)))?;

        info!("Received {} catalog tables", update.tables().len());
        Ok(update)
    }
}

/// Join base URL and API path into a directory-style URL
fn api_base(base_url: &str, api_path: &str) -> Result<Url> {
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
    let path = api_path.trim_start_matches('/');
    let path = if path.is_empty() || path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    };
    Ok(base.join(&path)?)
}
