mod file_config;

pub use file_config::{FileConfig, GamificationConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that participate in config resolution. Mirrors the CLI
/// fields that the TOML file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub cache_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub token_retention_days: u64,
    pub prune_interval_hours: u64,

    // Feature configs (with defaults)
    pub gamification: GamificationSettings,
}

#[derive(Debug, Clone)]
pub struct GamificationSettings {
    pub notification_debounce_ms: u64,
    pub notifications_limit: usize,
}

impl Default for GamificationSettings {
    fn default() -> Self {
        GamificationSettings {
            notification_debounce_ms: 1500,
            notifications_limit: 50,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("media"));

        let cache_path = file
            .cache_path
            .map(PathBuf::from)
            .or_else(|| cli.cache_path.clone())
            .unwrap_or_else(|| db_dir.join("cache"));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let token_retention_days = file
            .token_retention_days
            .unwrap_or(cli.token_retention_days);
        let prune_interval_hours = file
            .prune_interval_hours
            .unwrap_or(cli.prune_interval_hours);

        let gamification_file = file.gamification.unwrap_or_default();
        let gamification_defaults = GamificationSettings::default();
        let gamification = GamificationSettings {
            notification_debounce_ms: gamification_file
                .notification_debounce_ms
                .unwrap_or(gamification_defaults.notification_debounce_ms),
            notifications_limit: gamification_file
                .notifications_limit
                .unwrap_or(gamification_defaults.notifications_limit),
        };

        Ok(AppConfig {
            db_dir,
            media_path,
            cache_path,
            port,
            logging_level,
            frontend_dir_path,
            token_retention_days,
            prune_interval_hours,
            gamification,
        })
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
