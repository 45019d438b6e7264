//! Infrastructure layer for rxbus.
//!
//! Resolves the data directory and loads `config.toml` into the
//! `BusConfig` consumed by `rxbus-core`.

pub mod config;
pub mod filesystem;
