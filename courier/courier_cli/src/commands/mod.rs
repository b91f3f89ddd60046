//! Subcommand implementations.
//!
//! Each command builds a small actor topology on a fresh actor system, runs
//! it, stops it, and returns a JSON report.

pub mod broadcast;
pub mod echo;
pub mod relay;
pub mod send;
pub mod timer;

use anyhow::Context;
use courier_concurrency::{ActorSystem, Supervisor};
use courier_core::Value;
use std::time::Duration;

use crate::config::CliConfig;

/// Parse a JSON argument into a payload value.
pub fn parse_value(text: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("invalid JSON value: {}", text))
}

/// Parse a JSON argument that must be a message (an array).
pub fn parse_message(text: &str) -> anyhow::Result<Value> {
    let value = parse_value(text)?;
    anyhow::ensure!(
        value.is_array(),
        "message must be a JSON array, got {}",
        value.type_name()
    );
    Ok(value)
}

/// A fresh actor system configured from the CLI configuration.
pub fn system(config: &CliConfig) -> anyhow::Result<ActorSystem> {
    Ok(ActorSystem::with_config(config.system_config())?)
}

/// Start every supervised actor and release the startup barrier.
pub fn launch(supervisor: &Supervisor) -> anyhow::Result<()> {
    supervisor.start_all().context("starting actors")?;
    Ok(())
}

/// Milliseconds argument as a duration.
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message() {
        assert!(parse_message(r#"["ping", 1]"#).unwrap().is_array());
        assert!(parse_message(r#"{"a": 1}"#).is_err());
        assert!(parse_message("not json").is_err());
    }
}
