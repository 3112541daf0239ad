//! Fan-out of process events to subscribers.

use seq_protocol::ipc::ProcessEvent;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Set of channels a process reports its lifecycle to.
///
/// Every subscriber gets its own unbounded channel, so emitting never waits
/// on a subscriber and a receiver that is only read after the run still
/// sees every event. Closed channels are dropped on the next emission.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: Vec<UnboundedSender<ProcessEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new channel and return its receiving half.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ProcessEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    /// Register an externally created channel.
    pub fn add_listener(&mut self, listener: UnboundedSender<ProcessEvent>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every open listener.
    pub fn emit(&mut self, event: ProcessEvent) {
        self.listeners.retain(|listener| {
            let open = listener.send(event.clone()).is_ok();
            if !open {
                debug!(event = event.kind(), "dropping closed event listener");
            }
            open
        });
    }
}
