//! Progress events
//!
//! The pipeline reports progress over an unbounded channel instead of writing
//! to the console. Sending never blocks, and a receiver that went away is
//! ignored, so a slow or absent reporter cannot change pipeline ordering.

use crate::core::transfer::pipeline::PipelineState;
use crate::core::transfer::summary::RunSummary;
use std::time::Duration;
use tokio::sync::mpsc;

/// Progress notification emitted by the transfer pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// The pipeline entered a new state
    StateChanged(PipelineState),

    /// Target collection was cleared
    Cleared { removed: u64 },

    /// A batch was flushed
    BatchWritten {
        batch_len: usize,
        total_collected: u64,
        docs_written: u64,
        elapsed: Duration,
    },

    /// Run completed
    Completed(RunSummary),

    /// Run failed; connections have been released
    Failed { message: String },
}

/// Receiving half handed to a reporter
pub type EventReceiver = mpsc::UnboundedReceiver<TransferEvent>;

/// Sending half held by the pipeline
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<TransferEvent>>,
}

impl EventSink {
    /// Create a connected sink and its receiver
    pub fn channel() -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// Wrap an existing sender
    pub fn new(sender: mpsc::UnboundedSender<TransferEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Send an event without waiting
    pub fn emit(&self, event: TransferEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                tracing::trace!("Progress receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(TransferEvent::StateChanged(PipelineState::Connected));
        sink.emit(TransferEvent::Cleared { removed: 3 });
        drop(sink);

        assert_eq!(
            rx.recv().await,
            Some(TransferEvent::StateChanged(PipelineState::Connected))
        );
        assert_eq!(rx.recv().await, Some(TransferEvent::Cleared { removed: 3 }));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(TransferEvent::Cleared { removed: 0 });
    }

    #[test]
    fn test_disabled_sink() {
        EventSink::disabled().emit(TransferEvent::Failed {
            message: "ignored".to_string(),
        });
    }
}
