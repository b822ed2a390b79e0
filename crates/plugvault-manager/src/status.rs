//! Plugin status derivation
//!
//! Status is computed from an ordered list of rules; the first rule that
//! matches decides. `Downloading` is never derived here, the manager sets it
//! for the duration of a download.

use plugvault_core::version::is_newer;
use plugvault_core::{CatalogVersion, Plugin, PluginId, PluginStatus, VersionError};
use std::path::PathBuf;

/// Everything status derivation looks at
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub id: PluginId,
    pub local_copy: bool,
    pub files: &'a [PathBuf],
    /// False while a download chain has not delivered its entry point
    pub has_main_file: bool,
    pub local_version: &'a str,
    pub local_sdk_version: &'a str,
    pub local_timestamp: i64,
    pub host_sdk_version: &'a str,
    /// Catalog releases built for `host_sdk_version`
    pub catalog_versions: &'a [CatalogVersion],
}

impl<'a> StatusInputs<'a> {
    pub fn for_plugin(
        plugin: &'a Plugin,
        host_sdk_version: &'a str,
        catalog_versions: &'a [CatalogVersion],
    ) -> Self {
        Self {
            id: plugin.id,
            local_copy: plugin.local_copy,
            files: &plugin.files,
            has_main_file: plugin.main_file_path().is_some(),
            local_version: &plugin.local_version,
            local_sdk_version: &plugin.local_sdk_version,
            local_timestamp: plugin.local_timestamp,
            host_sdk_version,
            catalog_versions,
        }
    }
}

type Rule = fn(&StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError>;

fn not_in_repository(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    Ok((i.id < 0).then_some(PluginStatus::Local))
}

fn no_compatible_release(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    Ok(i.catalog_versions
        .is_empty()
        .then_some(PluginStatus::Unavailable))
}

fn nothing_on_disk(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    Ok((!i.local_copy).then_some(PluginStatus::NotInstalled))
}

fn missing_files(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    let broken =
        i.files.is_empty() || !i.has_main_file || i.files.iter().any(|f| !f.exists());
    Ok(broken.then_some(PluginStatus::Broken))
}

fn older_sdk(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    // Records without an SDK version predate SDK tracking; rely on the
    // release version rules instead
    if i.local_sdk_version.is_empty() {
        return Ok(None);
    }
    Ok(is_newer(i.local_sdk_version, i.host_sdk_version)?.then_some(PluginStatus::OutOfDate))
}

fn newer_release(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    // An unknown installed version can only be fixed by reinstalling
    if i.local_version.is_empty() {
        return Ok(Some(PluginStatus::OutOfDate));
    }
    for release in i.catalog_versions {
        if is_newer(i.local_version, &release.version)? {
            return Ok(Some(PluginStatus::OutOfDate));
        }
    }
    Ok(None)
}

fn rebuilt_release(i: &StatusInputs<'_>) -> Result<Option<PluginStatus>, VersionError> {
    let rebuilt = i
        .catalog_versions
        .iter()
        .any(|r| r.version == i.local_version && r.timestamp > i.local_timestamp);
    Ok(rebuilt.then_some(PluginStatus::OutOfDate))
}

/// Status rules in precedence order
const RULES: &[(&str, Rule)] = &[
    ("local plugin", not_in_repository),
    ("no release for this SDK", no_compatible_release),
    ("not installed", nothing_on_disk),
    ("file missing", missing_files),
    ("built for older SDK", older_sdk),
    ("newer release", newer_release),
    ("same release rebuilt", rebuilt_release),
];

/// Derive a plugin's status. Malformed version strings are errors, not
/// guesses.
pub fn derive_status(inputs: &StatusInputs<'_>) -> Result<PluginStatus, VersionError> {
    for (name, rule) in RULES {
        if let Some(status) = rule(inputs)? {
            tracing::trace!("Plugin {}: {} -> {}", inputs.id, name, status);
            return Ok(status);
        }
    }
    Ok(PluginStatus::UpToDate)
}
