//! Mock construction helpers

use crossbeam_channel::{unbounded, Receiver};
use portflow::{MessageSink, TypedValue};
use std::sync::{Arc, Mutex};

/// Message sink backed by an unbounded channel
pub fn channel_sink() -> (Box<dyn MessageSink>, Receiver<TypedValue>) {
    let (tx, rx) = unbounded();
    (Box::new(tx), rx)
}

/// Sink that records every message it receives
#[derive(Clone, Default)]
pub struct RecordingSink {
    received: Arc<Mutex<Vec<TypedValue>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<TypedValue> {
        self.received.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn post_message(&self, value: TypedValue) {
        self.received.lock().unwrap().push(value);
    }
}
