//! Frame output
//!
//! Drains the channel sink, keeps the current input state and prints one
//! line per frame.

use crate::config::{OutputFormat, OutputSettings};
use common::{InputState, SinkEvent};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct FrameLine<'a> {
    frame: u64,
    state: &'a InputState,
}

pub struct EventPrinter {
    format: OutputFormat,
    changes_only: bool,
    state: InputState,
    frame_changed: bool,
    frames: u64,
}

impl EventPrinter {
    pub fn new(settings: &OutputSettings) -> Self {
        Self {
            format: settings.format,
            changes_only: settings.changes_only,
            state: InputState::new(),
            frame_changed: false,
            frames: 0,
        }
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Frames seen so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Feed one sink event. At a frame boundary, returns the line to print
    /// unless nothing changed and only changes are wanted.
    pub fn handle(&mut self, event: SinkEvent) -> Option<String> {
        if event != SinkEvent::Sync {
            self.frame_changed |= self.state.apply(event);
            return None;
        }

        self.frames += 1;
        let changed = std::mem::take(&mut self.frame_changed);
        if self.changes_only && !changed {
            return None;
        }

        match self.format {
            OutputFormat::Json => {
                let line = FrameLine {
                    frame: self.frames,
                    state: &self.state,
                };
                match serde_json::to_string(&line) {
                    Ok(json) => Some(json),
                    Err(e) => {
                        warn!("Failed to serialize frame {}: {}", self.frames, e);
                        None
                    }
                }
            }
            OutputFormat::Log => Some(self.summary()),
        }
    }

    fn summary(&self) -> String {
        let pressed: Vec<String> = self
            .state
            .buttons
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(button, _)| format!("{:?}", button))
            .collect();
        let axes: Vec<String> = self
            .state
            .axes
            .iter()
            .map(|(axis, value)| format!("{:?}={}", axis, value))
            .collect();

        format!(
            "frame {}: axes [{}] pressed [{}]",
            self.frames,
            axes.join(" "),
            pressed.join(" ")
        )
    }
}

/// Print frames until the channel closes
pub async fn run_output(events: async_channel::Receiver<SinkEvent>, mut printer: EventPrinter) {
    let json = printer.format == OutputFormat::Json;

    while let Ok(event) = events.recv().await {
        let Some(line) = printer.handle(event) else {
            continue;
        };

        if json {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
                warn!("Failed to write frame: {}", e);
                break;
            }
        } else {
            info!("{}", line);
        }
    }

    debug!("Output stopped after {} frames", printer.frames());
}
