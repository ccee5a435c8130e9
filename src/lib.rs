//! GeekLog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod assets;
pub mod config;
pub mod gamification;
pub mod library;
pub mod notifications;
pub mod richtext;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use assets::{AssetStore, FsAssetStore};
pub use gamification::{GamificationService, LocalCache};
pub use library::{LibraryStore, SqliteLibraryStore};
pub use notifications::NotificationDispatcher;
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserStore};
