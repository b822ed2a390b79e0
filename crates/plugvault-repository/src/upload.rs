//! Plugin submission
//!
//! Submitting a plugin is two requests: the metadata is posted first and
//! the server answers with a token, then the thumbnail image is uploaded
//! against that token. A pending submission can be cancelled.

use crate::client::RepositoryClient;
use crate::error::{RepositoryError, Result};
use plugvault_core::Publication;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Request header carrying the upload token
pub const FILE_TOKEN_HEADER: &str = "fileToken";

/// Plugin type code for native plugins
pub const NATIVE_PLUGIN_TYPE: u32 = 1;

/// Metadata for a new plugin submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub username: String,
    pub user_email: String,
    pub name: String,
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    pub description: String,
    #[serde(rename = "type")]
    pub plugin_type: u32,
    pub tags: Vec<String>,
    pub publications: Vec<Publication>,
}

impl SubmissionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            username: String::new(),
            user_email: String::new(),
            name: name.into(),
            repo_url: String::new(),
            description: String::new(),
            plugin_type: NATIVE_PLUGIN_TYPE,
            tags: Vec::new(),
            publications: Vec::new(),
        }
    }
}

impl RepositoryClient {
    /// Post submission metadata and remember the returned token
    pub async fn request_upload_slot(&self, request: &SubmissionRequest) -> Result<String> {
        self.check_gate()?;
        let url = self.endpoint("uploadPluginRequest")?;
        debug!("Requesting upload slot for plugin '{}'", request.name);

        let response = self.http.post(url).json(request).send().await?;
        let token = self.classify(response)?.text().await?.trim().to_string();
        if token.is_empty() {
            return Err(RepositoryError::malformed("empty upload token"));
        }

        if let Ok(mut pending) = self.pending_upload.lock() {
            *pending = Some(token.clone());
        }
        info!("Upload slot granted for plugin '{}'", request.name);
        Ok(token)
    }

    /// Upload the submission image; returns the server's message
    pub async fn upload_image(&self, token: &str, image: &Path) -> Result<String> {
        self.check_gate()?;
        let url = self.endpoint("uploadPluginImage")?;
        let body = tokio::fs::read(image).await?;
        debug!("Uploading {} ({} bytes)", image.display(), body.len());

        let response = self
            .http
            .post(url)
            .header(FILE_TOKEN_HEADER, token)
            .body(body)
            .send()
            .await?;
        let message = self.classify(response)?.text().await?;

        if let Ok(mut pending) = self.pending_upload.lock() {
            if pending.as_deref() == Some(token) {
                *pending = None;
            }
        }
        Ok(message)
    }

    /// Token of the submission awaiting its image, if any
    pub fn pending_upload(&self) -> Option<String> {
        self.pending_upload.lock().ok().and_then(|p| p.clone())
    }

    /// Abandon the pending submission. Does nothing when there is none.
    pub async fn cancel_upload(&self) -> Result<()> {
        let token = match self.pending_upload.lock() {
            Ok(mut pending) => pending.take(),
            Err(_) => None,
        };
        let Some(token) = token else {
            return Ok(());
        };

        self.check_gate()?;
        let url = self.endpoint("cancelUpload")?;
        let response = self
            .http
            .delete(url)
            .header(FILE_TOKEN_HEADER, token)
            .send()
            .await?;

        if let Err(e) = self.classify(response) {
            warn!("Repository did not acknowledge upload cancellation: {}", e);
            return Err(e);
        }
        info!("Pending upload cancelled");
        Ok(())
    }
}
