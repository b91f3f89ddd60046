//! Integration tests for the core data types.
//!
//! These cover the public surface the runtime builds on: messages built with
//! `message!`, path-addressed stores loaded from JSON, and the error
//! hierarchy as seen by callers.

use courier_core::error::{Error, Result, RouteError, StoreError};
use courier_core::{log_event, message, Store, Value};
use std::sync::Mutex;

/// Keeps every record logged to the actor target.
struct Capture {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for Capture {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.target() == "courier::actor"
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn read_depth(store: &Store) -> Result<i64> {
    Ok(store.get_as::<i64>("limits.depth")?)
}

#[test]
fn test_message_macro_builds_sequence() {
    let msg = message!["ping", 1, 2.5, true];

    assert_eq!(msg.len(), 4);
    assert_eq!(msg[0].as_str(), Some("ping"));
    assert_eq!(msg[1].as_integer(), Some(1));
    assert_eq!(msg[2].as_float(), Some(2.5));
    assert_eq!(msg[3].as_bool(), Some(true));

    let empty = message![];
    assert!(empty.is_empty());
}

#[test]
fn test_value_json_shapes() {
    let value: Value = serde_json::from_str(r#"["tick", {"n": 3, "tags": ["a"]}, null]"#).unwrap();

    let msg = value.into_message().unwrap();
    assert_eq!(msg[0], Value::from("tick"));
    assert_eq!(msg[1].get("n"), Some(&Value::Integer(3)));
    assert_eq!(msg[1].get("tags").and_then(|t| t.get_index(0)), Some(&Value::from("a")));
    assert!(msg[2].is_null());

    let scalar = Value::from(7);
    assert_eq!(scalar.into_message(), Err(Value::Integer(7)));
}

#[test]
fn test_store_loaded_from_json() {
    let store = Store::from_json_str(
        r#"{
            "limits": {"depth": 3},
            "interfaces": [{"name": "eth0"}, {"name": "eth1"}]
        }"#,
    )
    .unwrap();

    assert_eq!(read_depth(&store).unwrap(), 3);
    assert_eq!(store.get_as::<String>("interfaces[1].name").unwrap(), "eth1");
    assert_eq!(store.get("interfaces").and_then(Value::len), Some(2));
}

#[test]
fn test_store_errors_convert_to_root_error() {
    let store = Store::new();

    let err = read_depth(&store).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::UndefinedPath(ref p)) if p == "limits.depth"));
    assert_eq!(err.to_string(), "Store error: Undefined path: limits.depth");
}

#[test]
fn test_route_error_messages() {
    let err: Error = RouteError::DestinationNotFound("missing".into()).into();
    assert_eq!(err.to_string(), "Route error: Destination not found: missing");

    let err = RouteError::InvalidFormat("expected array, got string".into());
    assert!(err.to_string().contains("expected array"));
}

#[test]
fn test_log_event_formats_actor_records() {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Trace);

    log_event!("echo", "Initializing" => "AwaitingSync");
    log_event!(warn, "echo", "dropped", reason = "mailbox-full", depth = 3,);
    log_event!(info, "echo", "started");

    let records = CAPTURE.records.lock().unwrap();
    assert_eq!(
        *records,
        vec![
            (
                log::Level::Debug,
                "actor=echo event=transition from=Initializing to=AwaitingSync".to_string()
            ),
            (
                log::Level::Warn,
                "actor=echo event=dropped reason=mailbox-full depth=3".to_string()
            ),
            (log::Level::Info, "actor=echo event=started".to_string()),
        ]
    );
}
