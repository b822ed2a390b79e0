//! CLI command implementations

pub mod config;
pub mod connect;
pub mod info;
pub mod install;
pub mod list;
pub mod load;
pub mod local;
pub mod missing;
pub mod remove;
pub mod search;
pub mod submit;

mod common;
