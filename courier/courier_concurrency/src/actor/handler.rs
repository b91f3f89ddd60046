//! The lifecycle hooks an actor implementation supplies.

use courier_core::{Message, Value};
use log::warn;

use super::context::ActorContext;

/// Behavior of an actor.
///
/// Every hook runs on the actor's own thread, one at a time, so an
/// implementation can keep plain mutable state in `self`. Errors and panics
/// raised by a hook are caught and logged by the runtime.
///
/// ```
/// use courier_concurrency::actor::{ActorContext, Handler};
/// use courier_core::{Message, Value};
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn message(
///         &mut self,
///         _ctx: &ActorContext,
///         data: Option<Message>,
///         _from: Option<&str>,
///     ) -> anyhow::Result<Option<Value>> {
///         Ok(data.map(Value::Array))
///     }
/// }
/// ```
pub trait Handler: Send + 'static {
    /// One-time setup, before the actor reports ready. A failure here
    /// terminates the actor.
    fn initialize(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once after the supervisor releases the startup barrier.
    fn started(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle one message, or an idle tick when `data` is `None`.
    ///
    /// # Returns
    ///
    /// The result delivered to the sender when a reply was requested. Idle
    /// tick results are ignored.
    fn message(
        &mut self,
        ctx: &ActorContext,
        data: Option<Message>,
        from: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        if data.is_some() {
            warn!(
                "Actor {} has no message handler; dropped message from {}",
                ctx.name(),
                from.unwrap_or("<external>")
            );
        }
        Ok(None)
    }

    /// Last hook before termination. Must not block indefinitely.
    fn shutdown(&mut self, _ctx: &ActorContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A [`Handler`] whose `message` hook is a closure. Created by [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Build a handler from a message closure.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: FnMut(&ActorContext, Option<Message>, Option<&str>) -> anyhow::Result<Option<Value>>
        + Send
        + 'static,
{
    FnHandler { f }
}

impl<F> Handler for FnHandler<F>
where
    F: FnMut(&ActorContext, Option<Message>, Option<&str>) -> anyhow::Result<Option<Value>>
        + Send
        + 'static,
{
    fn message(
        &mut self,
        ctx: &ActorContext,
        data: Option<Message>,
        from: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        (self.f)(ctx, data, from)
    }
}

impl Handler for Box<dyn Handler> {
    fn initialize(&mut self, ctx: &ActorContext) -> anyhow::Result<()> {
        (**self).initialize(ctx)
    }

    fn started(&mut self, ctx: &ActorContext) -> anyhow::Result<()> {
        (**self).started(ctx)
    }

    fn message(
        &mut self,
        ctx: &ActorContext,
        data: Option<Message>,
        from: Option<&str>,
    ) -> anyhow::Result<Option<Value>> {
        (**self).message(ctx, data, from)
    }

    fn shutdown(&mut self, ctx: &ActorContext) -> anyhow::Result<()> {
        (**self).shutdown(ctx)
    }
}
