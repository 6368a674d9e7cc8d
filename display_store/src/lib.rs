pub mod geocoder;
pub mod importer;
pub mod map;
pub mod photo;
pub mod record;
pub mod store;

use crate::error::{ConfigError, InitializationError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const ENV_VAR_PREFIX: &str = "DISPLAYS__";
pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub geocoder: GeocoderConfig,
    pub import: ImportConfig,
    pub server: ServerConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub records_file: String,
    pub image_dir: PathBuf,
}

impl StorageConfig {
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            records_file: "locations.csv".to_string(),
            image_dir: PathBuf::from("data/images"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim compatible service, without the `/search` path.
    pub base_url: String,
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "street-display-registry/0.1".to_string(),
            min_interval_ms: 1500,
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImportConfig {
    pub default_city: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_city: record::DEFAULT_CITY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        // Berlin Lichtenberg
        Self {
            center_lat: 52.51,
            center_lon: 13.48,
            zoom: 13,
        }
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(SETTINGS_FILE)
}

pub fn load_config_from(settings_file: impl AsRef<Path>) -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(settings_file.as_ref()))
        .merge(Env::prefixed(ENV_VAR_PREFIX).split("__"))
        .extract::<Config>()?)
}

/// Creates the data and image directories if they do not exist yet.
pub fn prepare_storage(storage: &StorageConfig) -> Result<(), InitializationError> {
    fs::create_dir_all(&storage.data_dir)?;
    fs::create_dir_all(&storage.image_dir)?;
    info!(
        name: "storage.ready",
        data_dir = %storage.data_dir.display(),
        image_dir = %storage.image_dir.display(),
        "storage directories ready"
    );
    Ok(())
}

pub fn init_tracing() -> Result<(), InitializationError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

pub async fn shutdown_listener() {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(name: "signal.ctrlc.received", "received Ctrl+C signal, shutting down"),
        _ = terminate => info!(name: "signal.sigterm.received", "received SIGTERM signal, shutting down"),
    }
}

pub mod error {
    use crate::record::RecordId;
    use std::path::PathBuf;
    use thiserror::Error;
    use tracing::dispatcher::SetGlobalDefaultError;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("failed to load configuration: {0}")]
        Figment(#[from] figment::Error),
    }

    #[derive(Debug, Error)]
    pub enum InitializationError {
        #[error(transparent)]
        Tracing(#[from] SetGlobalDefaultError),
        #[error(transparent)]
        Config(#[from] ConfigError),
        #[error("failed to prepare storage: {0}")]
        Io(#[from] std::io::Error),
        #[error("failed to build HTTP client: {0}")]
        HttpClient(#[from] reqwest::Error),
    }

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("record file i/o error: {0}")]
        Io(#[from] std::io::Error),
        #[error("record file csv error: {0}")]
        Csv(#[from] csv::Error),
        #[error("record without an id cannot be saved")]
        BlankId,
        #[error("duplicate record id {0}")]
        DuplicateId(RecordId),
        #[error("no record with id {0}")]
        UnknownId(RecordId),
    }

    #[derive(Debug, Error)]
    pub enum ImportError {
        #[error("unsupported file format for {0}, expected .csv, .xlsx or .ods")]
        UnsupportedFormat(String),
        #[error("could not read csv upload: {0}")]
        Csv(#[from] csv::Error),
        #[error("could not read xlsx upload: {0}")]
        Xlsx(#[from] calamine::XlsxError),
        #[error("could not read ods upload: {0}")]
        Ods(#[from] calamine::OdsError),
        #[error("workbook contains no worksheet")]
        EmptyWorkbook,
        #[error("upload has no header row")]
        MissingHeader,
        #[error(transparent)]
        Store(#[from] StoreError),
    }

    #[derive(Debug, Error)]
    pub enum PhotoError {
        #[error("unsupported photo type {0}, expected jpg, jpeg or png")]
        UnsupportedExtension(String),
        #[error("photo upload is empty")]
        EmptyUpload,
        #[error("record id {0} cannot be used as a file name")]
        InvalidId(RecordId),
        #[error("photo file {0} does not exist")]
        Missing(PathBuf),
        #[error("photo i/o error: {0}")]
        Io(#[from] std::io::Error),
    }
}
