//! Table event observers.
//!
//! The table reports user-visible happenings through a [`TableObserver`].
//! Embedders implement the trait directly or use [`ChannelObserver`] to
//! receive events on a channel.

use crate::types::Row;

/// Something the embedding UI should react to
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// The selection callback fired with the current selection
    SelectionChanged(Vec<Row>),
    /// A reload failed and asked for the error indicator
    LoadingFailed,
}

/// Receiver of table events.
pub trait TableObserver: Send + Sync {
    /// Called for each event, synchronously from the table mutation
    fn on_event(&self, event: TableEvent);
}

/// An observer that discards everything
#[derive(Debug, Default)]
pub struct NoopObserver;

impl TableObserver for NoopObserver {
    fn on_event(&self, _event: TableEvent) {}
}

/// A channel-based observer implementation
pub struct ChannelObserver {
    sender: crossbeam_channel::Sender<TableEvent>,
}

impl ChannelObserver {
    /// Create a new channel-based observer
    pub fn new() -> (Self, crossbeam_channel::Receiver<TableEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelObserver { sender }, receiver)
    }
}

impl TableObserver for ChannelObserver {
    fn on_event(&self, event: TableEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer() {
        let (observer, receiver) = ChannelObserver::new();

        observer.on_event(TableEvent::LoadingFailed);
        observer.on_event(TableEvent::SelectionChanged(Vec::new()));

        assert_eq!(receiver.try_recv().unwrap(), TableEvent::LoadingFailed);
        assert!(matches!(
            receiver.try_recv().unwrap(),
            TableEvent::SelectionChanged(_)
        ));
        assert!(receiver.try_recv().is_err());
    }
}
