//! Common test infrastructure for plugvault-repository tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Modules
//!
//! - `constants`: API prefix and canned catalog payloads
//! - `mock_server`: Wiremock setup helpers for repository endpoints

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod mock_server;

pub use constants::*;
pub use mock_server::*;
