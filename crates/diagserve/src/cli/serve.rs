//! the `serve` subcommand - runs the publication server

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Context, Result, bail};
use diagserve_db::DiagDb;
use diagserve_types::{Config, DatabaseConfig, ExposureConfig};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::service::DiagService;

/// run the diagserve publication server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// database url (sqlite:// or postgres://)
    #[arg(long, env = "DIAGSERVE_DATABASE_URL")]
    database_url: Option<String>,

    /// address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "DIAGSERVE_LISTEN_ADDR")]
    listen_addr: String,

    /// maximum number of diagnosis keys accepted per upload
    #[arg(long, default_value_t = 14, env = "DIAGSERVE_MAX_UPLOAD_BATCH_SIZE")]
    max_upload_batch_size: usize,

    /// seconds between cache refreshes from the repository
    #[arg(long, default_value_t = 300, env = "DIAGSERVE_CACHE_REFRESH_INTERVAL")]
    cache_refresh_interval_secs: u64,

    /// path to an exposure configuration file (json)
    #[arg(long, env = "DIAGSERVE_EXPOSURE_CONFIG_FILE")]
    exposure_config_file: Option<PathBuf>,

    /// log level
    #[arg(long, default_value = "info", env = "DIAGSERVE_LOG_LEVEL")]
    log_level: String,
}

impl ServeCommand {
    /// convert cli arguments into a Config struct
    fn into_config(self) -> Result<Config> {
        let database = if let Some(db_url) = self.database_url {
            if db_url.starts_with("postgres://") || db_url.starts_with("postgresql://") {
                DatabaseConfig {
                    db_type: "postgres".to_string(),
                    connection_string: db_url,
                    ..DatabaseConfig::default()
                }
            } else if let Some(path) = db_url.strip_prefix("sqlite://") {
                DatabaseConfig {
                    db_type: "sqlite".to_string(),
                    connection_string: path.to_string(),
                    ..DatabaseConfig::default()
                }
            } else {
                bail!("database URL must start with sqlite:// or postgres://");
            }
        } else {
            DatabaseConfig::default()
        };

        let exposure = if let Some(path) = &self.exposure_config_file {
            info!("Loading exposure config from {:?}", path);
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read exposure config file: {:?}", path))?;
            serde_json::from_str::<ExposureConfig>(&content)
                .context("failed to parse exposure config file")?
        } else {
            ExposureConfig::default()
        };

        Ok(Config {
            listen_addr: self.listen_addr,
            max_upload_batch_size: self.max_upload_batch_size,
            cache_refresh_interval_secs: self.cache_refresh_interval_secs,
            database,
            exposure,
        })
    }

    /// run the serve command
    pub async fn run(self) -> Result<()> {
        // initialize logging
        let log_level = match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        info!("starting diagserve...");

        // load configuration
        let config = self.into_config()?;
        info!("Database: {}", config.database.connection_string);
        info!("Listen address: {}", config.listen_addr);
        info!(
            "Upload batch limit: {} keys, cache refresh every {}s",
            config.max_upload_batch_size, config.cache_refresh_interval_secs
        );

        // ensure parent directory exists for sqlite databases
        if config.database.db_type == "sqlite" {
            let db_path = std::path::Path::new(&config.database.connection_string);
            if let Some(parent) = db_path.parent()
                && !parent.exists()
            {
                info!("Creating database directory: {:?}", parent);
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory: {:?}", parent)
                })?;
            }
        }

        // initialize database
        let db = DiagDb::new(&config.database)
            .await
            .context("failed to initialize database")?;

        info!("Running database migrations...");
        db.migrate()
            .await
            .context("failed to run database migrations")?;

        info!("Database initialized successfully");

        // hydrate the cache and start the refresh task
        let service = DiagService::new(db.clone(), &config)
            .await
            .context("failed to hydrate diagnosis key cache")?;

        // build router
        let app = crate::create_app(db, service, config.exposure.clone());

        // parse listen address
        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .context("invalid listen address")?;

        info!("starting http server on {}", addr);

        // start server
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_requested())
            .await
            .context("server error")?;

        Ok(())
    }
}

/// future that resolves when a graceful shutdown has been requested.
async fn shutdown_requested() {
    tokio::signal::ctrl_c()
        .await
        .expect("unable to await CTRL-C");
}
