//! CLI command definitions for the `rxbus` binary.
//!
//! Uses clap derive macros for argument parsing. `rxbus demo <name>` runs one
//! of the bus walkthroughs against a fresh bus built from the loaded config.

pub mod config;
pub mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Walk through the typed sticky event bus.
#[derive(Parser)]
#[command(name = "rxbus", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for bus debug logs, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Read bus settings from this file instead of `{data_dir}/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a bus demonstration and print what each subscriber observed.
    Demo {
        #[command(subcommand)]
        demo: DemoCommand,
    },

    /// Print the effective bus configuration.
    Config,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoCommand {
    /// post "a", subscribe S1, post "b", subscribe S2, post "c".
    LateSubscriber,

    /// Sticky replay versus a plain subscription after postSticky("X").
    Sticky,

    /// Sticky overwrite, lookup, removal and clearing.
    Overwrite,

    /// Concurrent producers fanning out to several subscribers.
    Fanout {
        /// Events posted by each producer.
        #[arg(long, default_value = "100")]
        events: u32,

        /// Number of concurrent producers.
        #[arg(long, default_value = "4")]
        producers: u8,

        /// Number of subscribers.
        #[arg(long, default_value = "3")]
        subscribers: usize,
    },

    /// Callback listener whose handler fails on some events.
    Listener,
}

/// Tracing filter for the given verbosity flags.
///
/// `None` defers to `RUST_LOG`, which only happens when it is set and no
/// `-v`/`--quiet` flag was given.
pub fn log_filter(verbose: u8, quiet: bool, rust_log_set: bool) -> Option<&'static str> {
    match verbose {
        0 if quiet => Some("error"),
        0 if rust_log_set => None,
        0 => Some("warn"),
        1 => Some("info,rxbus_core=debug,rxbus_infra=debug"),
        _ => Some("trace"),
    }
}
