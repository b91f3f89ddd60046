//! `courier broadcast`: one message to every registered actor.

use clap::Args;
use courier_concurrency::actor::{handler_fn, SendRequest};
use courier_concurrency::Delivery;
use courier_core::{message, Value};
use serde_json::{json, Map};

use super::{launch, parse_message, system};
use crate::config::CliConfig;

const SENDER: &str = "cli";

/// Arguments for the broadcast command
#[derive(Args)]
pub struct BroadcastArgs {
    /// Number of listener actors
    #[clap(long, default_value_t = 3)]
    actors: usize,

    /// Message to broadcast, as a JSON array
    #[clap(long, default_value = r#"["hello"]"#)]
    message: String,
}

/// Broadcast to a group of listeners, then ask each how many copies it got
pub fn execute(args: &BroadcastArgs, config: &CliConfig) -> anyhow::Result<serde_json::Value> {
    let message = parse_message(&args.message)?;
    let system = system(config)?;
    let names: Vec<String> = (0..args.actors).map(|i| format!("listener-{}", i)).collect();

    let mut supervisor = system.supervisor();
    for name in &names {
        let mut received = 0i64;
        supervisor.add(system.actor(
            name,
            handler_fn(move |_ctx, data, from| match (data, from) {
                (Some(_), Some(SENDER)) => {
                    received += 1;
                    Ok(None)
                }
                (Some(_), None) => Ok(Some(Value::from(received))),
                _ => Ok(None),
            }),
        )?);
    }
    launch(&supervisor)?;

    let recipients = match system.send(SendRequest::new(message).sender(SENDER))? {
        Delivery::Broadcast { recipients } => recipients,
        _ => 0,
    };

    let mut received = Map::new();
    for name in &names {
        let count = system.ask(name, message!["count"], None)?;
        received.insert(name.clone(), serde_json::to_value(count)?);
    }

    supervisor.stop_all();
    system.shutdown();

    Ok(json!({ "recipients": recipients, "received": received }))
}
