//! Async channel bridge between transport worker threads and the Tokio runtime

use async_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::debug;

/// Events raised by the transport outside of any completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// A transfer reported that the device is gone
    DeviceLost,
}

/// Handle for Tokio runtime (async)
#[derive(Clone)]
pub struct EventBridge {
    event_rx: Receiver<TransportEvent>,
}

impl EventBridge {
    /// Receive an event from the transport
    pub async fn recv_event(&self) -> crate::Result<TransportEvent> {
        self.event_rx
            .recv()
            .await
            .map_err(|e| crate::Error::Channel(e.to_string()))
    }

    /// Try to receive an event without waiting
    pub fn try_recv_event(&self) -> Option<TransportEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Handle for transport worker threads (never blocks)
#[derive(Clone)]
pub struct EventNotifier {
    event_tx: Sender<TransportEvent>,
}

impl EventNotifier {
    /// Post an event. A full channel already holds an undelivered event, so
    /// the duplicate is dropped.
    pub fn notify(&self, event: TransportEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Event bridge full, dropping {:?}", event),
            Err(TrySendError::Closed(event)) => debug!("Event bridge closed, dropping {:?}", event),
        }
    }
}

/// Create the channel bridge between transport workers and Tokio
///
/// Returns (EventBridge for Tokio, EventNotifier for workers)
pub fn create_event_bridge() -> (EventBridge, EventNotifier) {
    let (event_tx, event_rx) = bounded(16);

    (EventBridge { event_rx }, EventNotifier { event_tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DEFAULT_TEST_TIMEOUT, with_timeout};

    #[tokio::test]
    async fn test_event_bridge() {
        let (bridge, notifier) = create_event_bridge();

        let handle = std::thread::spawn(move || {
            notifier.notify(TransportEvent::DeviceLost);
        });
        handle.join().unwrap();

        let event = with_timeout(DEFAULT_TEST_TIMEOUT, bridge.recv_event())
            .await
            .unwrap();
        assert_eq!(event.unwrap(), TransportEvent::DeviceLost);
    }

    #[test]
    fn test_notify_after_bridge_dropped() {
        let (bridge, notifier) = create_event_bridge();
        drop(bridge);
        notifier.notify(TransportEvent::DeviceLost);
    }

    #[tokio::test]
    async fn test_recv_after_notifier_dropped() {
        let (bridge, notifier) = create_event_bridge();
        drop(notifier);
        let closed = with_timeout(DEFAULT_TEST_TIMEOUT, bridge.recv_event())
            .await
            .unwrap();
        assert!(closed.is_err());
        assert!(bridge.try_recv_event().is_none());
    }
}
