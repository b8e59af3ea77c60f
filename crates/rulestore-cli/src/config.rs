use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rulestore_db_mongo::{MongoConfig, mask_password};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "rulestore.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive, e.g. `info` or `rulestore_adapter=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.mongodb.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        Ok(())
    }

    /// Applies command line overrides on top of file and environment settings.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(uri) = &cli.uri {
            self.mongodb.uri = uri.clone();
        }
        if let Some(database) = &cli.database {
            self.mongodb.database = database.clone();
        }
        if let Some(collection) = &cli.collection {
            self.mongodb.collection = collection.clone();
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Copy safe to print: the connection string has its password masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.mongodb.uri = mask_password(&config.mongodb.uri);
        config
    }
}

/// Reads `path` (or `rulestore.toml` when present) and environment overrides.
///
/// Environment variables use the `RULESTORE` prefix and `__` as separator,
/// e.g. `RULESTORE__MONGODB__DATABASE=authz`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = config::Config::builder();
    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(config::File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        config::Environment::with_prefix("RULESTORE")
            .try_parsing(true)
            .separator("__"),
    );

    let config = builder.build().context("Failed to read configuration")?;
    config
        .try_deserialize()
        .context("Invalid configuration")
}

/// Loads the configuration, applies CLI overrides and validates the result.
pub fn resolve(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.apply_cli(cli);
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.mongodb.uri, "mongodb://localhost:27017");
        assert_eq!(config.mongodb.database, "casbin");
        assert_eq!(config.mongodb.collection, "casbin_rule");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[mongodb]
uri = "mongodb://db.internal:27017"
database = "authz"

[logging]
level = "debug"
"#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.mongodb.uri, "mongodb://db.internal:27017");
        assert_eq!(config.mongodb.database, "authz");
        assert_eq!(config.mongodb.collection, "casbin_rule");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config("[mongodb]\ndatabase = \"authz\"\ncollection = \"rules\"\n");
        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from([
            "rulestore",
            "config",
            "--config",
            path.as_str(),
            "--database",
            "override",
            "--log-level",
            "trace",
        ])
        .unwrap();

        let config = resolve(&cli).unwrap();
        assert_eq!(config.mongodb.database, "override");
        assert_eq!(config.mongodb.collection, "rules");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_validation_rejects_empty_collection() {
        let file = write_config("[mongodb]\ncollection = \"\"\n");
        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["rulestore", "config", "--config", path.as_str()]).unwrap();

        let err = resolve(&cli).unwrap_err();
        assert_eq!(err.to_string(), "mongodb.collection must not be empty");
    }

    #[test]
    fn test_redacted_masks_password() {
        let mut config = AppConfig::default();
        config.mongodb.uri = "mongodb://admin:hunter2@db:27017".into();
        let redacted = config.redacted();
        assert!(!redacted.mongodb.uri.contains("hunter2"));
        assert_eq!(config.mongodb.uri, "mongodb://admin:hunter2@db:27017");
    }
}
