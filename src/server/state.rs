use axum::extract::FromRef;

use crate::assets::AssetStore;
use crate::gamification::GamificationService;
use crate::library::LibraryStore;
use crate::notifications::NotificationDispatcher;
use crate::user::UserStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLibraryStore = Arc<dyn LibraryStore>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedAssetStore = Arc<dyn AssetStore>;
pub type GuardedGamificationService = Arc<GamificationService>;
pub type GuardedNotificationDispatcher = Arc<NotificationDispatcher>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub library_store: GuardedLibraryStore,
    pub user_store: GuardedUserStore,
    pub asset_store: GuardedAssetStore,
    pub gamification: GuardedGamificationService,
    pub notifier: GuardedNotificationDispatcher,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedLibraryStore {
    fn from_ref(input: &ServerState) -> Self {
        input.library_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedAssetStore {
    fn from_ref(input: &ServerState) -> Self {
        input.asset_store.clone()
    }
}

impl FromRef<ServerState> for GuardedGamificationService {
    fn from_ref(input: &ServerState) -> Self {
        input.gamification.clone()
    }
}

impl FromRef<ServerState> for GuardedNotificationDispatcher {
    fn from_ref(input: &ServerState) -> Self {
        input.notifier.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
