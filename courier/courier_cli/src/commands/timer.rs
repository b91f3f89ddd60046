//! `courier timer`: arm a named timer and report its deliveries.

use clap::Args;
use courier_core::{message, Message, Value};
use courier_concurrency::actor::{ActorContext, Handler};
use serde_json::json;
use std::thread;

use super::{launch, millis, parse_value, system};
use crate::config::CliConfig;

/// Arguments for the timer command
#[derive(Args)]
pub struct TimerArgs {
    /// Timer name
    #[clap(long, default_value = "tick")]
    name: String,

    /// Delay before the timer fires, in milliseconds
    #[clap(long, default_value_t = 50)]
    delay_ms: u64,

    /// Value delivered with the timer, as JSON
    #[clap(long, default_value = "null")]
    value: String,

    /// Kill the timer right after arming it
    #[clap(long)]
    kill: bool,

    /// How long to watch for deliveries, in milliseconds
    #[clap(long, default_value_t = 300)]
    wait_ms: u64,
}

/// Records its own timer deliveries and reports them when asked.
struct Clock {
    deliveries: Vec<Value>,
}

impl Handler for Clock {
    fn message(
        &mut self,
        ctx: &ActorContext,
        data: Option<Message>,
        from: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        match (data, from) {
            (Some(data), Some(sender)) if sender == ctx.name() => {
                self.deliveries.push(Value::Array(data));
                Ok(None)
            }
            (Some(_), None) => Ok(Some(Value::Array(self.deliveries.clone()))),
            _ => Ok(None),
        }
    }
}

/// Arm the timer on a clock actor, optionally kill it, and list what arrived
pub fn execute(args: &TimerArgs, config: &CliConfig) -> anyhow::Result<serde_json::Value> {
    let value = parse_value(&args.value)?;
    let system = system(config)?;

    let mut supervisor = system.supervisor();
    supervisor.add(system.actor("clock", Clock { deliveries: Vec::new() })?);
    launch(&supervisor)?;

    let killed = match supervisor.get("clock") {
        Some(clock) => {
            clock.set_timer(&args.name, millis(args.delay_ms), value)?;
            args.kill && clock.kill_timer(&args.name)
        }
        None => false,
    };

    thread::sleep(millis(args.wait_ms));
    let deliveries = system.ask("clock", message!["deliveries"], None)?;

    supervisor.stop_all();
    system.shutdown();

    Ok(json!({
        "timer": args.name,
        "killed": killed,
        "deliveries": deliveries.unwrap_or_else(|| Value::Array(Vec::new())),
    }))
}
