//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases, asset directory
//! and gamification cache, plus pre-provisioned users and session tokens.

use super::constants::*;
use chrono::Utc;
use geeklog_server::assets::{AssetStore, FsAssetStore};
use geeklog_server::gamification::{GamificationService, LocalCache};
use geeklog_server::library::{LibraryStore, SqliteLibraryStore};
use geeklog_server::notifications::NotificationDispatcher;
use geeklog_server::server::server::make_app;
use geeklog_server::server::ServerConfig;
use geeklog_server::user::{
    AuthToken, AuthTokenValue, SqliteUserStore, UserAuthTokenStore, UserStore,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated storage
///
/// When dropped, the server shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Session token of the primary test user
    pub token: String,

    /// Session token of the secondary test user
    pub other_token: String,

    /// User store for direct database access in tests
    pub user_store: Arc<dyn UserStore>,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

fn mint_token(user_store: &Arc<dyn UserStore>, handle: &str) -> String {
    let user_id = user_store.create_user(handle).expect("create user");
    let token = AuthToken {
        user_id,
        value: AuthTokenValue::generate(),
        created: Utc::now().timestamp(),
        last_used: None,
    };
    user_store
        .add_user_auth_token(token.clone())
        .expect("store token");
    token.value.0
}

impl TestServer {
    /// Spawns a new test server on a random port with two provisioned users.
    pub async fn spawn() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let library_store: Arc<dyn LibraryStore> = Arc::new(
            SqliteLibraryStore::new(temp_dir.path().join("library.db"))
                .expect("Failed to open library store"),
        );
        let user_store: Arc<dyn UserStore> = Arc::new(
            SqliteUserStore::new(temp_dir.path().join("users.db"))
                .expect("Failed to open user store"),
        );
        let asset_store: Arc<dyn AssetStore> = Arc::new(
            FsAssetStore::new(temp_dir.path().join("media"))
                .expect("Failed to create asset store"),
        );
        let cache = Arc::new(
            LocalCache::new(temp_dir.path().join("cache")).expect("Failed to create cache"),
        );

        let token = mint_token(&user_store, TEST_USER);
        let other_token = mint_token(&user_store, OTHER_USER);

        let notifier = NotificationDispatcher::new(
            Arc::new(user_store.clone()),
            Duration::from_millis(NOTIFICATION_DEBOUNCE_MS),
        );
        let gamification = Arc::new(GamificationService::new(
            library_store.clone(),
            user_store.clone(),
            cache,
            notifier.clone(),
        ));

        let app = make_app(
            ServerConfig::default(),
            library_store,
            user_store.clone(),
            asset_store,
            gamification,
            notifier,
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        let server = TestServer {
            base_url,
            port,
            token,
            other_token,
            user_store,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_until_ready().await;
        server
    }

    async fn wait_until_ready(&self) {
        let client = reqwest::Client::new();
        let deadline =
            std::time::Instant::now() + Duration::from_millis(SERVER_READY_TIMEOUT_MS);
        loop {
            if let Ok(response) = client.get(&self.base_url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            if std::time::Instant::now() > deadline {
                panic!("Test server did not become ready in time");
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }
}
