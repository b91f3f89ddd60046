//! Convenience macros for the Courier runtime.

/// Log an actor lifecycle event as a `key=value` record.
///
/// Records go to the `courier::actor` target, so lifecycle noise can be
/// filtered separately from the rest of the runtime. The short form logs a
/// state transition at debug level. The long form takes a `log` level
/// (`error`, `warn`, `info`, `debug` or `trace`), the actor name, an event
/// name and any number of `key = value` fields.
///
/// # Examples
///
/// ```
/// use courier_core::log_event;
///
/// // actor=echo event=transition from=Initializing to=AwaitingSync
/// log_event!("echo", "Initializing" => "AwaitingSync");
///
/// // actor=echo event=dropped reason=mailbox-full
/// log_event!(warn, "echo", "dropped", reason = "mailbox-full");
/// ```
#[macro_export]
macro_rules! log_event {
    ($actor:expr, $from:expr => $to:expr $(,)?) => {
        $crate::log_event!(debug, $actor, "transition", from = $from, to = $to)
    };

    ($level:ident, $actor:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::__log::$level!(
            target: "courier::actor",
            concat!("actor={} event={}" $(, " ", stringify!($key), "={}")*),
            $actor,
            $event
            $(, $value)*
        )
    };
}
