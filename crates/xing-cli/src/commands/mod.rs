//! CLI subcommand implementations.

pub mod events;
pub mod predict;
pub mod record;
pub mod stats;
pub mod status;
pub mod sync;

use anyhow::{Context, Result};

/// Builds the runtime the async commands are driven on.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")
}
