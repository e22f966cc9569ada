// LCU Watcher module - polls the League client, accepts ready checks and reports players

pub mod types;
pub mod logging;
pub mod session;
pub mod retry;
pub mod publisher;
pub mod tracker;
pub mod watcher;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use logging::{init_logging, LogFormat};
pub use publisher::{ChannelPublisher, LogPublisher, Publisher, RecordingPublisher};
pub use retry::{RetryOutcome, RetryPolicy};
pub use tracker::SessionTracker;
pub use watcher::{start_lcu_watcher, LoopControl, ReadyCheckAcceptor, WatcherHandles};
