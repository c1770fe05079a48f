//! vidzpro Core Library
//!
//! Client for the vidzpro training-video backend, local key-value storage and
//! the anti-skip watch tracker that gates marking a video as understood.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod library;
pub mod player;
pub mod queues;
pub mod session;
pub mod status;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod workers;

// Re-export commonly used items at crate root
pub use api::{ApiClient, ApiService};
pub use auth::AuthService;
pub use config::{AppConfig, GateConfig};
pub use error::{Result, VidzproError};
pub use events::UserAction;
pub use format::{
    format_date, format_phone_number, format_timestamp, format_watched, key_points,
};
pub use library::{CertificateKind, VideoPager};
pub use player::{PlayerCommand, PlayerEvent, PlayerSource};
pub use session::{Effect, Notice, ReportOutcome, SessionSnapshot, WatchSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::{CompletionState, GateError};
pub use types::{VideoDetail, VideoId};
pub use workers::{SessionHandle, SessionOutput, open_session};
