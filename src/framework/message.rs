//! Delivery of out-of-band messages posted on an output port.

use crossbeam_channel::Sender;

use crate::value::TypedValue;

/// Receiver of messages posted on a port.
///
/// Called once per message, synchronously, in posting order.
#[cfg_attr(test, mockall::automock)]
pub trait MessageSink: Send {
    fn post_message(&self, value: TypedValue);
}

impl MessageSink for Sender<TypedValue> {
    fn post_message(&self, value: TypedValue) {
        if let Err(err) = self.send(value) {
            tracing::warn!(
                "Dropping message of type {}: receiver disconnected",
                err.0.type_string()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_channel_sink_preserves_order() {
        let (tx, rx) = unbounded();
        tx.post_message(TypedValue::new(1u32));
        tx.post_message(TypedValue::new("two".to_string()));

        assert_eq!(*rx.recv().unwrap().extract::<u32>().unwrap(), 1);
        assert_eq!(rx.recv().unwrap().extract::<String>().unwrap(), "two");
    }

    #[test]
    fn test_disconnected_sink_drops_quietly() {
        let (tx, rx) = unbounded::<TypedValue>();
        drop(rx);
        tx.post_message(TypedValue::new(5i64));
    }

    #[test]
    fn test_mock_sink_receives_value() {
        let mut sink = MockMessageSink::new();
        sink.expect_post_message()
            .withf(|value| value.is::<u8>())
            .times(1)
            .return_const(());
        sink.post_message(TypedValue::new(3u8));
    }
}
