//! HTTP client for the Plugvault plugin repository
//!
//! Provides:
//! - Catalog sync (server schema plus bulk table update)
//! - Chained per-file plugin downloads with progress reporting
//! - Plugin submission (metadata request, image upload, cancellation)
//! - A sticky version gate: once the server answers 426 the client
//!   refuses every further request

pub mod client;
pub mod download;
pub mod error;
pub mod upload;

pub use client::RepositoryClient;
pub use download::{DownloadProgress, DownloadedFile, PluginFileInfo};
pub use error::{RepositoryError, Result};
pub use upload::SubmissionRequest;

/// Client version sent with every request
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying [`VERSION`] for the server-side version gate
pub const CLIENT_VERSION_HEADER: &str = "x-client-version";
