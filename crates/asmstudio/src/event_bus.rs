use anyhow::Result;
use std::collections::HashMap;

use crate::editor_view::Program;
use crate::views::ViewId;

/// A cross-component event. Views never call each other; they observe
/// these through the routing table the session controller registers at
/// startup.
#[derive(Debug, Clone)]
pub enum Event {
    /// The editor's program changed; carries a fresh snapshot.
    ProgramChanged(Program),
    /// The engine advanced and machine state may have changed.
    ExecutionStepped,
    /// The running program exited with the given code.
    ExecutionExited(i32),
    /// A different view became visible.
    ViewActivated(ViewId),
    /// The processor panel asked for an engine reset.
    ResetRequested,
    /// The processor panel asked for the current program to be
    /// re-published without a textual edit.
    ReloadRequested,
    /// A line of program output for the execution log.
    LogLine(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProgramChanged,
    ExecutionStepped,
    ExecutionExited,
    ViewActivated,
    ResetRequested,
    ReloadRequested,
    LogLine,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ProgramChanged(_) => EventKind::ProgramChanged,
            Event::ExecutionStepped => EventKind::ExecutionStepped,
            Event::ExecutionExited(_) => EventKind::ExecutionExited,
            Event::ViewActivated(_) => EventKind::ViewActivated,
            Event::ResetRequested => EventKind::ResetRequested,
            Event::ReloadRequested => EventKind::ReloadRequested,
            Event::LogLine(_) => EventKind::LogLine,
        }
    }
}

/// Subscriber callback. Handlers run against the shared routing context
/// and may return follow-up events, which the controller publishes after
/// the current delivery completes.
pub type Handler<C> = Box<dyn FnMut(&mut C, &Event) -> Result<Vec<Event>>>;

/// Synchronous publish/subscribe channel.
///
/// Subscriptions are established once at startup. Delivery is same-call,
/// in registration order. A failing handler does not stop delivery to
/// the handlers after it; failures are aggregated and returned once
/// every handler has run.
pub struct EventBus<C> {
    subscribers: HashMap<EventKind, Vec<Handler<C>>>,
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    pub fn subscribe(&mut self, kind: EventKind, handler: Handler<C>) {
        self.subscribers.entry(kind).or_default().push(handler);
    }

    pub fn publish(
        &mut self,
        ctx: &mut C,
        event: &Event,
        follow_ups: &mut Vec<Event>,
    ) -> Result<()> {
        let Some(handlers) = self.subscribers.get_mut(&event.kind()) else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for handler in handlers.iter_mut() {
            match handler(ctx, event) {
                Ok(mut events) => follow_ups.append(&mut events),
                Err(e) => failures.push(e),
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            n => {
                let joined = failures
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(anyhow::anyhow!(
                    "{} handlers failed for {:?}: {}",
                    n,
                    event.kind(),
                    joined
                ))
            }
        }
    }
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}
