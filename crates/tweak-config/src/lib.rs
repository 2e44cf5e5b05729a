//! Configuration types and loaders for the tweak console.
//!
//! This crate owns the on-disk settings schema so the host binary and tests
//! share a single source of truth.

pub mod settings;

pub use settings::{ConsoleSettings, CONFIG_ENV, CONFIG_FILE};
