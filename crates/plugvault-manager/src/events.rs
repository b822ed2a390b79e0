//! Notifications broadcast by the plugin manager
//!
//! Front ends subscribe through [`crate::PluginManager::subscribe`]; a slow
//! subscriber only loses its own backlog.

use plugvault_core::PluginId;

/// Plugin manager notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// Catalog, ledger and loader state have been reconciled
    PluginsReady,

    /// Bytes received for one file of a plugin download
    DownloadProgress {
        id: PluginId,
        file_index: u32,
        downloaded_bytes: u64,
        /// 0 when the server did not announce a size
        total_bytes: u64,
    },

    /// All files of a plugin are installed and the plugin is loaded
    DownloadFinished { id: PluginId },

    /// Install, load or runtime state of a plugin changed
    PluginUpdated { id: PluginId },

    /// An operation failed. `fatal` errors end repository access.
    Error { message: String, fatal: bool },

    /// Submission accepted; the image can now be uploaded with `token`
    ReadyForImageUpload { token: String },

    /// Submission complete, with the server's message
    UploadFinished { message: String },
}

impl ManagerEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ManagerEvent::PluginsReady => "plugins_ready",
            ManagerEvent::DownloadProgress { .. } => "download_progress",
            ManagerEvent::DownloadFinished { .. } => "download_finished",
            ManagerEvent::PluginUpdated { .. } => "plugin_updated",
            ManagerEvent::Error { .. } => "error",
            ManagerEvent::ReadyForImageUpload { .. } => "ready_for_image_upload",
            ManagerEvent::UploadFinished { .. } => "upload_finished",
        }
    }
}
