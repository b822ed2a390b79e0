//! Plugin file download with progress tracking
//!
//! A plugin is made of one or more files fetched one request at a time.
//! Each response carries the metadata for that file in headers, including
//! the index of the next file; the last file has no next index. The caller
//! drives the chain so it can persist every file as it lands.

use crate::client::RepositoryClient;
use crate::error::{RepositoryError, Result};
use futures_util::StreamExt;
use plugvault_core::PluginId;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Request header selecting which file of the plugin to send
pub const FILE_INDEX_HEADER: &str = "fileIndex";

/// Download progress information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Total bytes to download (0 when the server did not say)
    pub total_bytes: u64,

    /// Bytes downloaded so far
    pub downloaded_bytes: u64,
}

/// Metadata the server attaches to each plugin file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFileInfo {
    /// File name reduced to its final path component
    pub filename: String,
    pub plugin_id: PluginId,
    /// Index to request next; `None` on the last file
    pub next_file_index: Option<u32>,
    pub version: String,
    pub sdk_version: String,
    pub is_main: bool,
    /// Release build time, unix seconds, when the server sends it
    pub timestamp: Option<i64>,
}

/// A plugin file written to disk
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub info: PluginFileInfo,
    pub path: PathBuf,
    pub size: u64,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

fn required<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    header(headers, name)
        .ok_or_else(|| RepositoryError::malformed(format!("missing '{}' header", name)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Reduce a server supplied name to a bare file name
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

impl PluginFileInfo {
    /// Parse file metadata from response headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let raw_name = required(headers, "filename")?;
        let filename = sanitize_file_name(raw_name)
            .ok_or_else(|| RepositoryError::malformed(format!("unusable file name '{}'", raw_name)))?;

        let plugin_id = required(headers, "pluginId")?
            .parse::<PluginId>()
            .map_err(|_| RepositoryError::malformed("'pluginId' is not an integer"))?;

        // Absent, empty or negative means there is nothing after this file
        let next_file_index = match header(headers, "nextFileIndex") {
            None | Some("") => None,
            Some(value) => {
                let index = value
                    .parse::<i64>()
                    .map_err(|_| RepositoryError::malformed("'nextFileIndex' is not an integer"))?;
                u32::try_from(index).ok()
            }
        };

        let is_main = parse_bool(required(headers, "isMainFile")?)
            .ok_or_else(|| RepositoryError::malformed("'isMainFile' is not a boolean"))?;

        let timestamp = match header(headers, "timestamp") {
            None | Some("") => None,
            Some(value) => Some(
                value
                    .parse::<i64>()
                    .map_err(|_| RepositoryError::malformed("'timestamp' is not an integer"))?,
            ),
        };

        Ok(Self {
            filename,
            plugin_id,
            next_file_index,
            version: required(headers, "version")?.to_string(),
            sdk_version: required(headers, "sdkVersion")?.to_string(),
            is_main,
            timestamp,
        })
    }
}

impl RepositoryClient {
    /// Fetch one file of a plugin into `dest_dir`.
    ///
    /// The body is streamed to `<name>.part` and renamed into place once
    /// complete, so a failed transfer never leaves a truncated file under
    /// the final name.
    pub async fn fetch_plugin_file(
        &self,
        plugin_id: PluginId,
        file_index: u32,
        dest_dir: &Path,
        progress: &mut (dyn FnMut(DownloadProgress) + Send),
    ) -> Result<DownloadedFile> {
        self.check_gate()?;
        let url = self.endpoint(&format!("plugins/{}", plugin_id))?;
        debug!("Requesting file {} of plugin {}", file_index, plugin_id);

        let response = self
            .http
            .get(url)
            .header(FILE_INDEX_HEADER, file_index.to_string())
            .timeout(self.download_timeout)
            .send()
            .await?;
        let response = self.classify(response)?;

        let info = PluginFileInfo::from_headers(response.headers())?;
        if info.plugin_id != plugin_id {
            return Err(RepositoryError::malformed(format!(
                "asked for plugin {} but received plugin {}",
                plugin_id, info.plugin_id
            )));
        }

        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| ct.parse::<u64>().ok())
            .unwrap_or(0);

        fs::create_dir_all(dest_dir).await?;
        let file_path = dest_dir.join(&info.filename);
        let temp_file_path = dest_dir.join(format!("{}.part", info.filename));

        let written = match stream_to_file(response, &temp_file_path, total_size, progress).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_file_path).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_file_path, &file_path).await {
            let _ = fs::remove_file(&temp_file_path).await;
            return Err(e.into());
        }
        info!(
            "Downloaded {} for plugin {} ({} bytes)",
            info.filename, plugin_id, written
        );

        Ok(DownloadedFile {
            info,
            path: file_path,
            size: written,
        })
    }
}

/// Write the response body to `path`, reporting progress per chunk.
/// Returns the number of bytes written.
async fn stream_to_file(
    response: reqwest::Response,
    path: &Path,
    total_bytes: u64,
    progress: &mut (dyn FnMut(DownloadProgress) + Send),
) -> Result<u64> {
    let mut file = fs::File::create(path).await?;
    let mut tracker = DownloadProgress {
        total_bytes,
        downloaded_bytes: 0,
    };
    progress(tracker);

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk: bytes::Bytes = chunk?;
        file.write_all(&chunk).await?;
        tracker.downloaded_bytes += chunk.len() as u64;
        progress(tracker);
    }

    file.flush().await?;
    Ok(tracker.downloaded_bytes)
}
