#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the flood map server and CLI.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual fields:
//!
//! | Variable             | Field             |
//! |----------------------|-------------------|
//! | `FLOOD_MAP_DATA_DIR` | `data.dir`        |
//! | `FLOOD_MAP_CITY`     | `dashboard.city`  |
//! | `BIND_ADDR`          | `server.bind_addr`|
//! | `PORT`               | `server.port`     |
//!
//! ```toml
//! [data]
//! dir = "data"
//! boundary_url = "https://example.org/boundary.json"
//!
//! [server]
//! port = 9000
//! ```

use std::path::{Path, PathBuf};

use flood_map_asset_models::ScenarioYear;
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Input data locations.
    pub data: DataConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Initial dashboard state.
    pub dashboard: DashboardConfig,
}

/// Where the findings spreadsheet and `GeoJSON` layers live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory holding the data files.
    pub dir: PathBuf,
    /// Findings spreadsheet file name.
    pub totals_file: String,
    /// Municipality boundary file name.
    pub boundary_file: String,
    /// 2025 exposed assets file name.
    pub assets_2025_file: String,
    /// 2050 exposed assets file name.
    pub assets_2050_file: String,
    /// Fetch the findings spreadsheet from here instead of `dir`.
    pub totals_url: Option<String>,
    /// Fetch the boundaries from here instead of `dir`.
    pub boundary_url: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            totals_file: "8_municipality_findings.csv".to_string(),
            boundary_file: "boundary.json".to_string(),
            assets_2025_file: "assets_2025.geojson".to_string(),
            assets_2050_file: "assets_2050.geojson".to_string(),
            totals_url: None,
            boundary_url: None,
        }
    }
}

impl DataConfig {
    /// Path of the findings spreadsheet.
    #[must_use]
    pub fn totals_path(&self) -> PathBuf {
        self.dir.join(&self.totals_file)
    }

    /// Path of the municipality boundaries.
    #[must_use]
    pub fn boundary_path(&self) -> PathBuf {
        self.dir.join(&self.boundary_file)
    }

    /// Path of a scenario's exposed assets.
    #[must_use]
    pub fn assets_path(&self, year: ScenarioYear) -> PathBuf {
        self.dir.join(match year {
            ScenarioYear::Current => &self.assets_2025_file,
            ScenarioYear::Projected => &self.assets_2050_file,
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Initial dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Municipality key to open, as the `city` URL parameter would give it.
    pub city: Option<String>,
    /// Viewport width in pixels. Desktop layout when unset.
    pub viewport_width: Option<f64>,
    /// Viewport height in pixels.
    pub viewport_height: Option<f64>,
}

impl AppConfig {
    /// Parses a TOML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed or has
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Loads the config file if one is given and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                log::info!("Loaded config from {}", path.display());
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("FLOOD_MAP_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
        if let Some(city) = lookup("FLOOD_MAP_CITY") {
            self.dashboard.city = Some(city);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring invalid PORT {port:?}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn defaults_match_data_layout() {
        let config = AppConfig::default();
        assert_eq!(
            config.data.totals_path(),
            PathBuf::from("data/8_municipality_findings.csv")
        );
        assert_eq!(
            config.data.assets_path(ScenarioYear::Projected),
            PathBuf::from("data/assets_2050.geojson")
        );
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dashboard.city, None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [data]
            dir = "/srv/flood"
            boundary_url = "https://example.org/boundary.json"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(
            config.data.boundary_path(),
            PathBuf::from("/srv/flood/boundary.json")
        );
        assert_eq!(
            config.data.boundary_url.as_deref(),
            Some("https://example.org/boundary.json")
        );
        assert_eq!(config.data.totals_file, "8_municipality_findings.csv");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("[server]\nhost = \"0.0.0.0\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn environment_overrides() {
        let env = BTreeMap::from([
            ("FLOOD_MAP_DATA_DIR", "/tmp/flood"),
            ("FLOOD_MAP_CITY", "CAMDEN CITY"),
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "not-a-port"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.data.dir, PathBuf::from("/tmp/flood"));
        assert_eq!(config.dashboard.city.as_deref(), Some("CAMDEN CITY"));
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 8080, "invalid port is ignored");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            AppConfig::load(Some(Path::new("/nonexistent/flood_map.toml"))),
            Err(ConfigError::Io { .. })
        ));
    }
}
