//! Server configuration: defaults, an optional TOML file, then CLI flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::{LoadOptions, DEFAULT_COUNTRY_FILTER};

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub country_filter: Option<String>,
    pub strict_order: Option<bool>,
}

/// Values given on the command line; these win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub dat: Option<PathBuf>,
    pub country: Option<String>,
    pub strict_order: bool,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: String,
    pub dat: PathBuf,
    pub load: LoadOptions,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let dat = overrides
            .dat
            .or(self.database.path)
            .context("No database file given (use --dat or [database] path)")?;

        Ok(Settings {
            listen: overrides
                .listen
                .or(self.server.listen)
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            dat,
            load: LoadOptions {
                country_filter: overrides
                    .country
                    .or(self.database.country_filter)
                    .unwrap_or_else(|| DEFAULT_COUNTRY_FILTER.to_string()),
                strict_order: overrides.strict_order
                    || self.database.strict_order.unwrap_or(false),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Config::default()
            .resolve(Overrides {
                dat: Some("ip.dat".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.listen, DEFAULT_LISTEN);
        assert_eq!(settings.dat, PathBuf::from("ip.dat"));
        assert_eq!(settings.load.country_filter, "CN");
        assert!(!settings.load.strict_order);
    }

    #[test]
    fn test_cli_overrides_file() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:9000"

            [database]
            path = "/srv/ip.dat"
            country_filter = "JP"
            strict_order = true
            "#,
        )
        .unwrap();

        let settings = config
            .resolve(Overrides {
                listen: Some("127.0.0.1:9100".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.listen, "127.0.0.1:9100");
        assert_eq!(settings.dat, PathBuf::from("/srv/ip.dat"));
        assert_eq!(settings.load.country_filter, "JP");
        assert!(settings.load.strict_order);
    }

    #[test]
    fn test_missing_database_path() {
        assert!(Config::default().resolve(Overrides::default()).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("[server]\nport = 80\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"ip.dat\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("ip.dat")));
        assert!(config.server.listen.is_none());
    }
}
