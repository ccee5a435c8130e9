pub mod models;
mod schema;
mod sqlite_library_store;
mod store;

pub use models::*;
pub use sqlite_library_store::SqliteLibraryStore;
pub use store::LibraryStore;
