// Commands module - Re-exports the client, the watcher and their shared types
pub mod config;
pub mod error;
pub mod lcu_communication;
pub mod lcu_watcher;
pub mod live_game;
pub mod match_history;
pub mod types;

// Re-export the pieces callers reach for most
pub use config::WatcherConfig;
pub use error::LcuError;
pub use lcu_communication::{LcuApi, LcuClient};
pub use lcu_watcher::*;
pub use live_game::LiveGameView;
pub use match_history::GameSummary;
pub use types::*;
