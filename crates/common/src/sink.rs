//! Event sink seam
//!
//! Decoded frames leave the driver through an [`EventSink`]. A frame is a run
//! of `report_*` calls closed by exactly one `sync()`. Sinks are called from
//! the transport's worker contexts, so they must not block.

use protocol::{Axis, Button, InputEvent};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Consumer of decoded input
pub trait EventSink: Send + Sync {
    fn report_axis(&self, axis: Axis, value: i32);
    fn report_button(&self, button: Button, pressed: bool);
    /// Marks one frame boundary
    fn sync(&self);
}

/// Report every event of one decoded frame, then sync once
pub fn emit_frame(sink: &dyn EventSink, events: &[InputEvent]) {
    for event in events {
        match *event {
            InputEvent::Axis { id, value } => sink.report_axis(id, value),
            InputEvent::Button { id, pressed } => sink.report_button(id, pressed),
        }
    }
    sink.sync();
}

/// One sink call, as carried over a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    Axis { id: Axis, value: i32 },
    Button { id: Button, pressed: bool },
    Sync,
}

impl From<InputEvent> for SinkEvent {
    fn from(event: InputEvent) -> Self {
        match event {
            InputEvent::Axis { id, value } => SinkEvent::Axis { id, value },
            InputEvent::Button { id, pressed } => SinkEvent::Button { id, pressed },
        }
    }
}

/// Drops between two "channel full" warnings
pub const DROP_WARN_INTERVAL: u64 = 1000;

/// Whether the `total`-th drop is logged. The first one always is.
fn warn_on_drop(total: u64) -> bool {
    total == 1 || total % DROP_WARN_INTERVAL == 0
}

/// Forwards sink calls over a bounded async channel
///
/// Never blocks: when the consumer falls behind, events are dropped and
/// counted. Only the first drop and every [`DROP_WARN_INTERVAL`]th after it
/// are logged.
pub struct ChannelSink {
    tx: async_channel::Sender<SinkEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it
    pub fn new(capacity: usize) -> (Self, async_channel::Receiver<SinkEvent>) {
        let (tx, rx) = async_channel::bounded(capacity);
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Events dropped because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn send(&self, event: SinkEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(async_channel::TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if warn_on_drop(total) {
                    warn!("Event channel full, dropped event (total dropped: {})", total);
                }
            }
            Err(async_channel::TrySendError::Closed(_)) => {
                debug!("Event channel closed, discarding {:?}", event);
            }
        }
    }
}

impl EventSink for ChannelSink {
    fn report_axis(&self, axis: Axis, value: i32) {
        self.send(SinkEvent::Axis { id: axis, value });
    }

    fn report_button(&self, button: Button, pressed: bool) {
        self.send(SinkEvent::Button { id: button, pressed });
    }

    fn sync(&self) {
        self.send(SinkEvent::Sync);
    }
}

/// Current value of every logical input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputState {
    pub buttons: BTreeMap<Button, bool>,
    pub axes: BTreeMap<Axis, i32>,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            buttons: Button::ALL.iter().map(|b| (*b, false)).collect(),
            axes: Axis::ALL.iter().map(|a| (*a, 0)).collect(),
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one sink event. Returns true if a value changed.
    pub fn apply(&mut self, event: SinkEvent) -> bool {
        match event {
            SinkEvent::Axis { id, value } => self.axes.insert(id, value) != Some(value),
            SinkEvent::Button { id, pressed } => self.buttons.insert(id, pressed) != Some(pressed),
            SinkEvent::Sync => false,
        }
    }

    pub fn button(&self, button: Button) -> bool {
        self.buttons.get(&button).copied().unwrap_or(false)
    }

    pub fn axis(&self, axis: Axis) -> i32 {
        self.axes.get(&axis).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{DEFAULT_TEST_TIMEOUT, LevelRecorder, with_timeout};
    use tracing::Level;

    #[tokio::test]
    async fn test_channel_sink_forwards_frame() {
        let (sink, rx) = ChannelSink::new(16);
        emit_frame(
            &sink,
            &[
                InputEvent::axis(Axis::X, 42),
                InputEvent::button(Button::Trigger, true),
            ],
        );

        let recv = || with_timeout(DEFAULT_TEST_TIMEOUT, rx.recv());

        assert_eq!(
            recv().await.unwrap().unwrap(),
            SinkEvent::Axis {
                id: Axis::X,
                value: 42
            }
        );
        assert_eq!(
            recv().await.unwrap().unwrap(),
            SinkEvent::Button {
                id: Button::Trigger,
                pressed: true
            }
        );
        assert_eq!(recv().await.unwrap().unwrap(), SinkEvent::Sync);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, rx) = ChannelSink::new(1);
        sink.sync();
        sink.sync();
        sink.sync();
        assert_eq!(sink.dropped(), 2);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_stalled_consumer_warns_sparingly() {
        let (sink, _rx) = ChannelSink::new(1);
        sink.sync();

        let recorder = LevelRecorder::new();
        recorder.record(|| {
            for _ in 0..DROP_WARN_INTERVAL * 2 {
                sink.sync();
            }
        });

        assert_eq!(sink.dropped(), DROP_WARN_INTERVAL * 2);
        // first drop, then drops 1000 and 2000
        assert_eq!(recorder.count(Level::WARN), 3);
    }

    #[test]
    fn test_channel_sink_closed_does_not_count_drops() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        sink.report_axis(Axis::Y, 1);
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_input_state_tracks_changes() {
        let mut state = InputState::new();
        assert!(!state.button(Button::Trigger));

        assert!(state.apply(SinkEvent::Button {
            id: Button::Trigger,
            pressed: true
        }));
        assert!(!state.apply(SinkEvent::Button {
            id: Button::Trigger,
            pressed: true
        }));
        assert!(state.button(Button::Trigger));

        assert!(state.apply(SinkEvent::Axis {
            id: Axis::Pad2Vertical,
            value: -1
        }));
        assert_eq!(state.axis(Axis::Pad2Vertical), -1);
        assert!(!state.apply(SinkEvent::Sync));
    }

    #[test]
    fn test_input_state_covers_every_identifier() {
        let state = InputState::new();
        assert_eq!(state.buttons.len(), Button::ALL.len());
        assert_eq!(state.axes.len(), Axis::ALL.len());
    }
}
