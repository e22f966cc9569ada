// Result publisher: where the poll loops hand events to the presentation layer

use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::commands::types::WatcherEvent;

/// Event sink for the poll loops.
///
/// `publish` is called from inside a tick and must return promptly; slow
/// sinks should queue and deliver elsewhere.
pub trait Publisher: Send + Sync {
  fn publish(&self, event: WatcherEvent);
}

/// Forwards events over an unbounded channel so the poll loop never waits.
#[derive(Clone)]
pub struct ChannelPublisher {
  tx: mpsc::UnboundedSender<WatcherEvent>,
}

impl ChannelPublisher {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<WatcherEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Publisher for ChannelPublisher {
  fn publish(&self, event: WatcherEvent) {
    if let Err(e) = self.tx.send(event) {
      tracing::debug!("[Publisher] Receiver gone, dropping {:?}", e.0);
    }
  }
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

impl Publisher for LogPublisher {
  fn publish(&self, event: WatcherEvent) {
    match &event {
      WatcherEvent::StatusMessage(message) => tracing::info!("[Status] {}", message),
      other => tracing::info!("[Event] {:?}", other),
    }
  }
}

/// Keeps every event in memory; handy for one-shot commands and tests.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
  events: Mutex<Vec<WatcherEvent>>,
}

impl RecordingPublisher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<WatcherEvent> {
    self
      .events
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .clone()
  }

  pub fn take(&self) -> Vec<WatcherEvent> {
    std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
  }
}

impl Publisher for RecordingPublisher {
  fn publish(&self, event: WatcherEvent) {
    self
      .events
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(event);
  }
}
