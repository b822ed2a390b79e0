//! Common test infrastructure for plugvault-manager tests
//!
//! # Modules
//!
//! - `constants`: API prefix and the canned catalog
//! - `fixtures`: A manager wired to a mock repository and a temp directory
//! - `mocks`: In-memory native loader

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod constants;
pub mod fixtures;
pub mod mocks;

pub use constants::*;
pub use fixtures::*;
pub use mocks::*;
