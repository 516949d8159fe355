pub mod model;


use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

// Re-export main types
pub use self::model::{ColumnConfig, Config, DatabaseConfig, ImportConfig, LoggingConfig};

/// Where the effective configuration came from. Reported once logging is up,
/// since loading happens before the subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "Loaded config from {}", path.display()),
            ConfigSource::Defaults(path) => {
                write!(f, "No config file at {}, using defaults", path.display())
            }
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        if fs::try_exists(path).await? {
            let config = Self::load(path).await?;
            Ok((config, ConfigSource::File(path.to_path_buf())))
        } else {
            Ok((Self::default(), ConfigSource::Defaults(path.to_path_buf())))
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            anyhow::bail!("database.path cannot be empty");
        }

        self.import.table_identifier().context("import.table")?;
        self.import.column_mapping().context("import.columns")?;
        self.import.delimiter_byte().context("import.delimiter")?;

        if !matches!(self.logging.verbosity.as_str(), "silent" | "normal" | "verbose") {
            anyhow::bail!("verbosity must be 'silent', 'normal', or 'verbose'");
        }

        Ok(())
    }
}
