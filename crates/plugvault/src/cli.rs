//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Plugvault - browse, install and load native plugins
#[derive(Parser, Debug)]
#[command(name = "plugvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command. These take precedence over the
/// config file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding config.yaml (default: ~/.plugvault)
    #[arg(long, global = true, env = "PLUGVAULT_CONFIG_DIR")]
    pub config_dir: Option<Utf8PathBuf>,

    /// Repository base URL
    #[arg(long, global = true)]
    pub repository_url: Option<String>,

    /// Host SDK version plugins must be built for
    #[arg(long, global = true)]
    pub sdk_version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize the plugin catalog
    Connect(ConnectArgs),

    /// List plugins and their status
    List(ListArgs),

    /// Show details of one plugin
    Info(PluginArgs),

    /// Search the catalog by name, owner, description or tag
    Search(SearchArgs),

    /// Download and install a plugin
    Install(InstallArgs),

    /// Remove an installed plugin
    Remove(RemoveArgs),

    /// Check that an installed plugin, or all of them, loads
    Load(LoadArgs),

    /// Load a plugin library that is not in the repository
    LoadLocal(LoadLocalArgs),

    /// Stop tracking a local plugin
    Forget(ForgetArgs),

    /// Report which of the named plugins are not loaded
    Missing(MissingArgs),

    /// Submit a new plugin to the repository
    Submit(SubmitArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Re-sync even when the catalog is current
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show installed plugins only
    #[arg(long)]
    pub installed: bool,

    /// Filter by tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Work from the local cache without contacting the repository
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PluginArgs {
    /// Plugin id or name
    #[arg(allow_negative_numbers = true)]
    pub plugin: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for
    pub term: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Plugin ids or names
    #[arg(required = true)]
    pub plugins: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Plugin id or name
    #[arg(allow_negative_numbers = true)]
    pub plugin: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Plugin id or name
    #[arg(required_unless_present = "all", conflicts_with = "all", allow_negative_numbers = true)]
    pub plugin: Option<String>,

    /// Load every installed plugin
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct LoadLocalArgs {
    /// Path to the plugin library
    pub path: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Local plugin id or name
    #[arg(allow_negative_numbers = true)]
    pub plugin: String,
}

#[derive(Args, Debug)]
pub struct MissingArgs {
    /// Names of plugins a model requires
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Offer to install missing plugins found in the catalog
    #[arg(long)]
    pub install: bool,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Plugin name
    #[arg(long)]
    pub name: String,

    /// Submitter user name
    #[arg(long)]
    pub username: String,

    /// Submitter email
    #[arg(long)]
    pub email: String,

    /// Source repository URL
    #[arg(long)]
    pub repo_url: String,

    /// Short description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Thumbnail image to upload
    #[arg(long)]
    pub image: Utf8PathBuf,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
