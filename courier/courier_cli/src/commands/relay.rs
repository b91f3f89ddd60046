//! `courier relay`: a worker's result forwarded to a collector.

use clap::Args;
use courier_concurrency::actor::{handler_fn, SendRequest, DEFAULT_REPLY_TOKEN};
use courier_core::{message, Value};
use serde_json::json;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use super::{launch, millis, parse_value, system};
use crate::config::CliConfig;

/// Arguments for the relay command
#[derive(Args)]
pub struct RelayArgs {
    /// Token placed in front of the forwarded result
    #[clap(long, default_value = DEFAULT_REPLY_TOKEN)]
    token: String,

    /// Value handed to the worker, as JSON
    #[clap(long, default_value = "42")]
    value: String,

    /// How long to wait for the collector, in milliseconds
    #[clap(long, default_value_t = 1000)]
    timeout_ms: u64,
}

/// Send `[value]` to the worker with its result forwarded to the collector,
/// then report what the collector received
pub fn execute(args: &RelayArgs, config: &CliConfig) -> anyhow::Result<serde_json::Value> {
    let value = parse_value(&args.value)?;
    let system = system(config)?;

    let mut last: Option<Value> = None;
    let mut supervisor = system.supervisor();
    supervisor
        .add(system.actor(
            "worker",
            handler_fn(|_ctx, data, _from| {
                Ok(data.and_then(|mut data| (!data.is_empty()).then(|| data.remove(0))))
            }),
        )?)
        .add(system.actor(
            "collector",
            handler_fn(move |_ctx, data, from| match (data, from) {
                (Some(data), Some(sender)) => {
                    let mut record = BTreeMap::new();
                    record.insert("data".to_string(), Value::Array(data));
                    record.insert("from".to_string(), Value::from(sender));
                    last = Some(Value::Map(record));
                    Ok(None)
                }
                (Some(_), None) => Ok(last.clone()),
                _ => Ok(None),
            }),
        )?);
    launch(&supervisor)?;

    system.send(
        SendRequest::new(Value::Array(vec![value]))
            .to("worker")
            .forward_with_token("collector", args.token.as_str()),
    )?;

    let deadline = Instant::now().checked_add(millis(args.timeout_ms));
    let received = loop {
        let received = system.ask("collector", message!["last"], None)?;
        let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if received.is_some() || expired {
            break received;
        }
        thread::sleep(Duration::from_millis(10));
    };

    supervisor.stop_all();
    system.shutdown();

    Ok(json!({ "token": args.token, "collected": received }))
}
