//! `courier send`: fire-and-forget to a named actor.

use clap::Args;
use courier_concurrency::actor::handler_fn;
use courier_core::RouteError;
use log::info;
use serde_json::json;

use super::{launch, parse_message, system};
use crate::config::CliConfig;

/// Arguments for the send command
#[derive(Args)]
pub struct SendArgs {
    /// Destination actor. Only `echo` exists.
    #[clap(long)]
    to: String,

    /// Message to send, as a JSON array
    #[clap(long, default_value = r#"["ping"]"#)]
    message: String,
}

/// Send to `to` and report the routing status. An unknown destination is
/// reported, not treated as a failure.
pub fn execute(args: &SendArgs, config: &CliConfig) -> anyhow::Result<serde_json::Value> {
    let message = parse_message(&args.message)?;
    let system = system(config)?;

    let mut supervisor = system.supervisor();
    supervisor.add(system.actor(
        "echo",
        handler_fn(|ctx, data, from| {
            if let Some(data) = data {
                info!("{} received {:?} from {:?}", ctx.name(), data, from);
            }
            Ok(None)
        }),
    )?);
    launch(&supervisor)?;

    let status = match system.tell(&args.to, message) {
        Ok(_) => "queued".to_string(),
        Err(RouteError::DestinationNotFound(_)) => "destination-not-found".to_string(),
        Err(e) => e.to_string(),
    };

    supervisor.stop_all();
    system.shutdown();

    Ok(json!({ "to": args.to, "status": status }))
}
