//! Plugin info command

use anyhow::Result;

use super::common::{display_name, offline, open_manager, resolve_plugin, sync};
use crate::cli::{GlobalArgs, PluginArgs};
use crate::output;

/// Show everything known about one plugin
pub async fn run(args: PluginArgs, global: &GlobalArgs) -> Result<()> {
    let manager = open_manager(global)?;
    if args.plugin.starts_with('-') {
        // Local plugins never need the repository
        offline(&manager);
    } else {
        sync(&manager, false).await?;
    }
    let plugin = resolve_plugin(&manager, &args.plugin)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plugin)?);
        return Ok(());
    }

    output::header(&display_name(&plugin));
    output::kv("Id", &plugin.id.to_string());
    output::kv("Status", &output::status(plugin.status));
    if !plugin.owner.is_empty() {
        output::kv("Owner", &plugin.owner);
    }
    if !plugin.description.is_empty() {
        output::kv("Description", &plugin.description);
    }
    if !plugin.source_url.is_empty() {
        output::kv("Source", &plugin.source_url);
    }
    if !plugin.tags.is_empty() {
        output::kv("Tags", &plugin.tags.join(", "));
    }
    if !plugin.is_local() {
        output::kv("Downloads", &plugin.downloads.to_string());
    }

    if plugin.local_copy {
        output::header("Installed");
        output::kv("Version", &plugin.local_version);
        output::kv("SDK version", &plugin.local_sdk_version);
        output::kv("Built", &output::timestamp(plugin.local_timestamp));
        for (index, file) in plugin.files.iter().enumerate() {
            let marker = if plugin.main_file == Some(index) { " (main)" } else { "" };
            output::kv("File", &format!("{}{}", file.display(), marker));
        }
    }

    if !plugin.publications.is_empty() {
        output::header("Publications");
        for publication in &plugin.publications {
            let mut line = publication.title.clone();
            if let Some(authors) = &publication.authors {
                line.push_str(&format!(", {}", authors));
            }
            if let Some(year) = &publication.year {
                line.push_str(&format!(" ({})", year));
            }
            if let Some(doi) = &publication.doi {
                line.push_str(&format!(" doi:{}", doi));
            }
            println!("  - {}", line);
        }
    }
    Ok(())
}
