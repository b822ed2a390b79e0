//! Type definitions for Plugvault configuration and plugins

mod plugin_types;
mod runtime_config;

pub use plugin_types::*;
pub use runtime_config::*;
