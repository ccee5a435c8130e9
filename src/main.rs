use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geeklog_server::assets::{AssetStore, FsAssetStore};
use geeklog_server::config::{AppConfig, CliConfig, FileConfig};
use geeklog_server::gamification::{GamificationService, LocalCache};
use geeklog_server::library::{LibraryStore, SqliteLibraryStore};
use geeklog_server::notifications::NotificationDispatcher;
use geeklog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use geeklog_server::user::{SqliteUserStore, UserAuthTokenStore, UserStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite databases (library.db, users.db).
    #[clap(value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to a TOML config file. File values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory for uploaded images (covers, avatars, milestone photos).
    /// Defaults to <db_dir>/media.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// Directory for the gamification local cache (streaks, weekly
    /// challenges). Defaults to <db_dir>/cache.
    #[clap(long, value_parser = parse_path)]
    pub cache_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Days an unused session token is kept before pruning. Set to 0 to
    /// disable pruning.
    #[clap(long, default_value_t = 90)]
    pub token_retention_days: u64,

    /// Interval in hours between pruning runs. Only used if
    /// token_retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        media_path: cli_args.media_path,
        cache_path: cli_args.cache_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        token_retention_days: cli_args.token_retention_days,
        prune_interval_hours: cli_args.prune_interval_hours,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite databases in {:?}...", config.db_dir);
    let library_store: Arc<dyn LibraryStore> =
        Arc::new(SqliteLibraryStore::new(config.db_dir.join("library.db"))?);
    let user_store: Arc<dyn UserStore> =
        Arc::new(SqliteUserStore::new(config.db_dir.join("users.db"))?);

    let asset_store: Arc<dyn AssetStore> = Arc::new(FsAssetStore::new(&config.media_path)?);
    let cache = Arc::new(LocalCache::new(&config.cache_path)?);

    let notifier = NotificationDispatcher::new(
        Arc::new(user_store.clone()),
        Duration::from_millis(config.gamification.notification_debounce_ms),
    );
    let gamification = Arc::new(GamificationService::new(
        library_store.clone(),
        user_store.clone(),
        cache,
        notifier.clone(),
    ));

    // Spawn background task for token pruning if enabled
    if config.token_retention_days > 0 {
        let retention_days = config.token_retention_days;
        let interval_hours = config.prune_interval_hours;
        let pruning_user_store = user_store.clone();

        info!(
            "Token pruning enabled: retaining {} days, pruning every {} hours",
            retention_days, interval_hours
        );

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_hours * 60 * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match pruning_user_store.prune_unused_auth_tokens(retention_days) {
                    Ok(count) => {
                        if count > 0 {
                            info!("Pruned {} stale session tokens", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to prune session tokens: {}", e);
                    }
                }
            }
        });
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        frontend_dir_path: config.frontend_dir_path.clone(),
        notifications_limit: config.gamification.notifications_limit,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        server_config,
        library_store,
        user_store,
        asset_store,
        gamification,
        notifier,
    )
    .await
}
