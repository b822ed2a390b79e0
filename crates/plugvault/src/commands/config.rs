//! Configuration commands

use anyhow::Result;
use serde::Serialize;

use super::common::load_config;
use crate::cli::{ConfigCommands, ConfigShowArgs, GlobalArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, global),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ResolvedLocations {
    data_dir: String,
    plugins_dir: String,
    ledger_file: String,
    cache_db: String,
}

fn show(args: ConfigShowArgs, global: &GlobalArgs) -> Result<()> {
    let (config, paths) = load_config(global)?;
    let locations = ResolvedLocations {
        data_dir: paths.data_dir.to_string(),
        plugins_dir: paths.plugins_dir.to_string(),
        ledger_file: paths.ledger_file.to_string(),
        cache_db: paths.cache_db.to_string(),
    };

    if args.json {
        let json = serde_json::json!({
            "config": config,
            "resolved-paths": locations,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", serde_yaml_ng::to_string(&config)?);
        output::header("Resolved paths");
        output::kv("Data", &locations.data_dir);
        output::kv("Plugins", &locations.plugins_dir);
        output::kv("Ledger", &locations.ledger_file);
        output::kv("Catalog cache", &locations.cache_db);
    }

    Ok(())
}
