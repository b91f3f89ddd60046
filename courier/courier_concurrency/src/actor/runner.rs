//! The body of an actor thread.

use courier_core::Value;
use log::{debug, error, info, warn};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use super::context::ActorContext;
use super::envelope::{Envelope, Letter, ReplyTo};
use super::handler::Handler;
use super::mailbox::{MailboxReceiver, ReceivePolicy, Received};
use super::registry::Registry;
use super::state::{ActorState, Lifecycle};
use super::timers::TimerSet;

pub(crate) struct Runner {
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) handler: Box<dyn Handler>,
    pub(crate) ctx: ActorContext,
    pub(crate) receiver: MailboxReceiver,
    pub(crate) policy: ReceivePolicy,
    pub(crate) registry: Arc<Registry>,
    pub(crate) mailbox_id: u64,
    pub(crate) timers: Arc<TimerSet>,
}

impl Runner {
    pub(crate) fn run(mut self) {
        self.lifecycle.transition(ActorState::Initializing);

        if let Err(fault) = self.invoke("initialize", |h, ctx| h.initialize(ctx)) {
            self.lifecycle.fail_initialization(fault);
            self.lifecycle.ready.open();
            self.finish();
            return;
        }

        self.lifecycle.transition(ActorState::AwaitingSync);
        self.lifecycle.ready.open();
        self.lifecycle.sync.wait();

        if self.lifecycle.is_aborted() {
            let discarded = self.receiver.drain();
            if discarded > 0 {
                warn!(
                    "Actor {} stopped before sync; discarded {} queued messages",
                    self.ctx.name(),
                    discarded
                );
            }
            self.finish();
            return;
        }

        self.lifecycle.transition(ActorState::Running);
        info!("Actor {} running", self.ctx.name());

        // A failed `started` is logged by `invoke`; the loop still runs.
        let _ = self.invoke("started", |h, ctx| h.started(ctx));

        self.process();
        self.finish();
    }

    fn process(&mut self) {
        loop {
            match self.receiver.receive(self.policy) {
                Received::Letter(Letter::Stop) => break,
                Received::Letter(Letter::Envelope(envelope)) => self.dispatch(envelope),
                Received::Idle => {
                    let _ = self.invoke("message", |h, ctx| h.message(ctx, None, None));
                    if self.policy == ReceivePolicy::Poll {
                        thread::yield_now();
                    }
                }
                Received::Closed => {
                    warn!("Mailbox of {} closed without a stop", self.ctx.name());
                    break;
                }
            }
        }
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let (data, from, reply_to) = envelope.into_parts();
        let result = self.invoke("message", |h, ctx| h.message(ctx, Some(data), from.as_deref()));

        match reply_to {
            ReplyTo::None => {
                if let Ok(Some(value)) = &result {
                    if !value.is_null() {
                        info!("Orphaned result from {}: {}", self.ctx.name(), value);
                    }
                }
            }
            reply_to => {
                self.ctx
                    .router()
                    .deliver_reply(self.ctx.name(), reply_to, result.map(normalize));
            }
        }
    }

    fn finish(&mut self) {
        self.lifecycle.transition(ActorState::Stopping);
        let _ = self.invoke("shutdown", |h, ctx| h.shutdown(ctx));

        let cancelled = self.timers.close();
        if cancelled > 0 {
            debug!("Cancelled {} timers of {}", cancelled, self.ctx.name());
        }

        self.registry.unregister(self.ctx.name(), self.mailbox_id);

        // Dropping late envelopes closes their reply channels.
        let late = self.receiver.drain();
        if late > 0 {
            debug!("Dropped {} late messages for {}", late, self.ctx.name());
        }

        self.lifecycle.transition(ActorState::Terminated);
        info!("Actor {} terminated", self.ctx.name());
    }

    /// Run a hook, catching errors and panics. Faults are logged and
    /// returned as text.
    fn invoke<T>(
        &mut self,
        hook: &str,
        f: impl FnOnce(&mut dyn Handler, &ActorContext) -> anyhow::Result<T>,
    ) -> Result<T, String> {
        let handler = self.handler.as_mut();
        let ctx = &self.ctx;

        match catch_unwind(AssertUnwindSafe(|| f(handler, ctx))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                let fault = format!("{:#}", e);
                error!("Actor {} {} failed: {}", self.ctx.name(), hook, fault);
                Err(fault)
            }
            Err(payload) => {
                let fault = format!("panic: {}", panic_message(payload.as_ref()));
                error!("Actor {} {} failed: {}", self.ctx.name(), hook, fault);
                Err(fault)
            }
        }
    }
}

// A null result is no result.
fn normalize(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<unknown panic>"
    }
}
