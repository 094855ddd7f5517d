//! Configuration loading and root folder resolution
//!
//! The root folder holds `dccn.db` and uploaded manuscripts. It is resolved
//! in priority order:
//! 1. Command-line argument
//! 2. `DCCN_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default
//!
//! A missing or unreadable config file never aborts startup: a warning is
//! logged and defaults are used.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "DCCN_ROOT_FOLDER";
pub const DATABASE_FILE_NAME: &str = "dccn.db";
pub const DEFAULT_PORT: u16 = 5780;

/// Values used when nothing else is configured
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            dirs::data_local_dir()
                .map(|d| d.join("dccn"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/dccn"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("dccn"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/dccn"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("dccn"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\dccn"))
        } else {
            PathBuf::from("./dccn_data")
        };

        Self {
            root_folder,
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// System notifications rendered on submission status changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Notify authors when their paper goes to review
    #[serde(default = "default_true")]
    pub submission_status_review: bool,
    /// Notify authors when review is revoked and the paper returns to SUBMIT
    #[serde(default = "default_true")]
    pub submission_status_submit: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            submission_status_review: true,
            submission_status_submit: true,
        }
    }
}

/// Contents of `config.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl TomlConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Command-line port, then `port` from the file, then the compiled default
    pub fn listen_port(&self, cli_arg: Option<u16>) -> u16 {
        cli_arg
            .or(self.port)
            .unwrap_or_else(|| CompiledDefaults::for_current_platform().port)
    }
}

/// First existing config file: `~/.config/dccn/config.toml`, then
/// `/etc/dccn/config.toml` on Linux
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("dccn").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/dccn/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Root folder resolution for one service
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!("[{}] root folder from command line", self.module_name);
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                debug!("[{}] root folder from {}", self.module_name, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(config_path) = config_file_path() {
            match TomlConfig::load(&config_path) {
                Ok(TomlConfig {
                    root_folder: Some(root),
                    ..
                }) => {
                    debug!("[{}] root folder from {}", self.module_name, config_path.display());
                    return root;
                }
                Ok(_) => {}
                Err(e) => warn!("[{}] {}; using default root folder", self.module_name, e),
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the resolved root folder for use
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
