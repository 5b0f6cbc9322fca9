// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reslice CLI entrypoint.
//!
//! Developer-facing commands for exercising the reslice core outside of a
//! host application:
//!
//! - `reslice compose` composes one slice-to-world matrix from a driver
//!   snapshot and a mode/rotation/flip configuration.
//! - `reslice replay <script.json>` builds an in-memory scene from a script,
//!   runs its configuration steps and driver events through the dispatcher,
//!   and prints what every step committed.
//!
//! # Usage
//! ```text
//! reslice [--format table|json] [--log <filter>] <command> [options]
//! ```
//!
//! Results go to stdout; logs go to stderr. The CLI exits with code `0` on
//! success and non-zero on error.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod compose;
mod output;
mod replay;
mod scene;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::Format;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive slice planes from frames, images and landmarks")]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table, global = true)]
    format: Format,
    /// Log filter directives (overrides RUST_LOG), e.g. `reslice_core=debug`
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one slice-to-world matrix from a driver pose
    Compose(compose::ComposeArgs),
    /// Run a JSON scene script through the dispatcher
    Replay(replay::ReplayArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref())?;

    let rendered = match &cli.command {
        Command::Compose(args) => compose::run(args, cli.format)?,
        Command::Replay(args) => replay::run(args, cli.format)?,
    };
    println!("{rendered}");
    Ok(())
}

fn init_tracing(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives).context("invalid --log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}
