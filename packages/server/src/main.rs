#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flood map API server binary.
//!
//! Reads the TOML file named by `FLOOD_MAP_CONFIG`, if set, then the
//! environment overrides documented in `flood_map_config`.

use std::path::PathBuf;

use flood_map_config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config_path = std::env::var("FLOOD_MAP_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).map_err(|e| {
        log::error!("{e}");
        std::io::Error::other(e)
    })?;

    flood_map_server::run_server(config).await
}
