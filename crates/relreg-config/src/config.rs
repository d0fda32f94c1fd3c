use std::{
    fs,
    path::{Path, PathBuf},
};

use documented::{Documented, DocumentedFields};
use relreg_utils::path::{resolve_path, xdg_config_home};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
};

pub const DEFAULT_ROOT_PATH: &str = "..";
pub const DEFAULT_OUTPUT_PATH: &str = "./dist";
pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_NAMESPACE_MARKER: &str = "__NAMESPACE__";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Application's configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Root of the source dataset. It holds the packages, sdks, apps,
    /// aws-lambda-layers and misc directories.
    /// Default: ..
    pub root_path: Option<String>,

    /// Directory the generated JSON tree is written to.
    /// It is deleted and recreated on every build.
    /// Default: ./dist
    pub output_path: Option<String>,

    /// Build pipeline settings.
    #[serde(default)]
    pub build: BuildSettings,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Settings for the build pipeline.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct BuildSettings {
    /// If true, the five domains are generated concurrently and entities within
    /// a domain are processed by a worker pool.
    /// Default: true
    pub parallel: Option<bool>,

    /// Maximum number of worker threads used by a parallel build.
    /// Default: 5
    pub max_workers: Option<usize>,

    /// Name of the marker file that turns a package directory into a namespace.
    /// Default: __NAMESPACE__
    pub namespace_marker: Option<String>,
}

/// Settings for `relreg serve`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct ServerSettings {
    /// Address the HTTP server binds to.
    /// Default: 0.0.0.0
    pub host: Option<String>,

    /// Port the HTTP server listens on. The PORT environment variable overrides it.
    /// Default: 8080
    pub port: Option<u16>,
}

/// Location of the configuration file: `$RELREG_CONFIG`, or
/// `$XDG_CONFIG_HOME/relreg/config.toml`.
pub fn default_config_path() -> PathBuf {
    match std::env::var("RELREG_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("relreg").join("config.toml"),
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            root_path: Some(DEFAULT_ROOT_PATH.to_string()),
            output_path: Some(DEFAULT_OUTPUT_PATH.to_string()),
            build: BuildSettings {
                parallel: Some(true),
                max_workers: Some(DEFAULT_MAX_WORKERS),
                namespace_marker: Some(DEFAULT_NAMESPACE_MARKER.to_string()),
            },
            server: ServerSettings {
                host: Some(DEFAULT_HOST.to_string()),
                port: Some(DEFAULT_PORT),
            },
        }
    }

    /// Loads the configuration from `path`, applies environment overrides and
    /// validates it. A missing file yields the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("loading configuration from {}", path.display());
                toml::from_str(&content)?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.apply_env_overrides()?;
        config.resolve()?;

        Ok(config)
    }

    /// Applies `RELREG_ROOT`, `RELREG_OUTPUT` and `PORT`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(root) = std::env::var("RELREG_ROOT") {
            self.root_path = Some(root);
        }
        if let Ok(output) = std::env::var("RELREG_OUTPUT") {
            self.output_path = Some(output);
        }
        if let Ok(port) = std::env::var("PORT") {
            let parsed = port.trim().parse::<u16>().ok().filter(|p| *p > 0).ok_or_else(|| {
                ConfigError::InvalidPort {
                    var: "PORT".to_string(),
                    value: port.clone(),
                }
            })?;
            self.server.port = Some(parsed);
        }
        Ok(())
    }

    /// Fills unset values with defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        self.root_path
            .get_or_insert_with(|| DEFAULT_ROOT_PATH.to_string());
        self.output_path
            .get_or_insert_with(|| DEFAULT_OUTPUT_PATH.to_string());

        self.build.parallel.get_or_insert(true);
        let workers = *self.build.max_workers.get_or_insert(DEFAULT_MAX_WORKERS);
        if workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(workers));
        }

        let marker = self
            .build
            .namespace_marker
            .get_or_insert_with(|| DEFAULT_NAMESPACE_MARKER.to_string())
            .as_str();
        if marker.is_empty() || marker.contains(['/', '\\']) || marker == "." || marker == ".."
        {
            return Err(ConfigError::InvalidNamespaceMarker(marker.to_string()));
        }

        self.server
            .host
            .get_or_insert_with(|| DEFAULT_HOST.to_string());
        self.server.port.get_or_insert(DEFAULT_PORT);

        Ok(())
    }

    pub fn get_root_path(&self) -> Result<PathBuf> {
        let root = self.root_path.as_deref().unwrap_or(DEFAULT_ROOT_PATH);
        Ok(resolve_path(root)?)
    }

    pub fn get_output_path(&self) -> Result<PathBuf> {
        let output = self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH);
        Ok(resolve_path(output)?)
    }

    pub fn parallel(&self) -> bool {
        self.build.parallel.unwrap_or(true)
    }

    pub fn max_workers(&self) -> usize {
        self.build.max_workers.unwrap_or(DEFAULT_MAX_WORKERS)
    }

    pub fn namespace_marker(&self) -> &str {
        self.build
            .namespace_marker
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE_MARKER)
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(table) = doc.get_mut("build").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<BuildSettings>(table, false)?;
        }
        if let Some(table) = doc.get_mut("server").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<ServerSettings>(table, false)?;
        }

        Ok(doc)
    }
}

/// Writes the annotated default configuration to `path`.
///
/// # Errors
///
/// [`ConfigError::ConfigAlreadyExists`] if a file is already present.
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let config_path = path.as_ref();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(
            config_path.display().to_string(),
        ));
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(())
}
