pub mod auth;
mod profile;
mod schema;
mod sqlite_user_store;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue};
pub use profile::{
    FavoritePick, FavoriteShelves, LibrarySortOrder, ProfileError, ThemePreference, UserProfile,
    MAX_FAVORITES_PER_SHELF,
};
pub use sqlite_user_store::SqliteUserStore;
pub use user_store::{UserAuthTokenStore, UserStore};
