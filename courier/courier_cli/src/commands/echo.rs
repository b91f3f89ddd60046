//! `courier echo`: synchronous round trip through an echo actor.

use clap::Args;
use courier_concurrency::actor::handler_fn;
use courier_core::Value;
use serde_json::json;

use super::{launch, millis, parse_message, system};
use crate::config::CliConfig;

/// Arguments for the echo command
#[derive(Args)]
pub struct EchoArgs {
    /// Message to send, as a JSON array
    #[clap(long, default_value = r#"["ping"]"#)]
    message: String,

    /// How long to wait for the reply, in milliseconds
    #[clap(long, default_value_t = 1000)]
    timeout_ms: u64,
}

/// Start an echo actor, send it the message and wait for the reply
pub fn execute(args: &EchoArgs, config: &CliConfig) -> anyhow::Result<serde_json::Value> {
    let message = parse_message(&args.message)?;
    let system = system(config)?;

    let mut supervisor = system.supervisor();
    supervisor.add(system.actor(
        "echo",
        handler_fn(|_ctx, data, _from| Ok(data.map(Value::Array))),
    )?);
    launch(&supervisor)?;

    let reply = system.ask("echo", message, Some(millis(args.timeout_ms)))?;

    supervisor.stop_all();
    system.shutdown();

    Ok(json!({ "actor": "echo", "reply": reply }))
}
