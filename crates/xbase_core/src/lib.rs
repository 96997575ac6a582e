//! Native core for the xbase mobile app.
//! Owns bundled-asset access, app configuration and the remote list screens.

pub mod asset;
pub mod config;
pub mod fetch;
pub mod logging;

pub use asset::{
    AssetError, AssetReader, AssetResult, AssetStore, AssetStream, DecodeKind, DirAssetStore,
    MemoryAssetStore, Properties,
};
pub use config::{AppConfig, ConfigError, CONFIG_ASSET_PATH};
pub use fetch::{
    builtin_screen, goods_type_screen, leave_message_screen, FetchError, HttpClient,
    JsonArrayAdapter, ListRow, ListScreen, Projection, ReqwestHttpClient, ScreenError,
    ScreenSpec, ScreenState,
};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogSettings};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
