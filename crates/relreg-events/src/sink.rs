use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use crate::BuildEvent;

/// Trait for consuming events.
///
/// Each frontend provides its own implementation.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BuildEvent);
}

/// Channel-based event sink.
///
/// Sends events through a standard mpsc channel so a progress renderer on
/// another thread can consume them.
pub struct ChannelSink {
    sender: Sender<BuildEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<BuildEvent>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender,
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: BuildEvent) {
        let _ = self.sender.send(event);
    }
}

/// No-op event sink for tests or headless operation.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: BuildEvent) {}
}

/// Collector sink that stores all events for inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<BuildEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: BuildEvent) {
        self.events.lock().unwrap().push(event);
    }
}
