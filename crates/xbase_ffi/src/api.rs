//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose asset reads, list screen loads and logging init to Dart via FRB.
//! - Flatten core error types into stable `error_code` + message envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - `asset_root` is the directory holding the unpacked app assets.

use log::warn;
use std::sync::Arc;
use std::time::Duration;
use xbase_core::{
    builtin_screen, core_version as core_version_inner, init_logging as init_logging_inner,
    init_logging_with, logging_status, ping as ping_inner, AppConfig, AssetError, AssetReader,
    ListRow, ListScreen, ReqwestHttpClient, ScreenState, CONFIG_ASSET_PATH,
};

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may create `log_dir`.
/// - Idempotent for the same `level + log_dir`; conflicts return an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Initializes logging at the `log.level` configured in `xbase.properties`
/// under `asset_root` (build default when the asset is missing).
///
/// # FFI contract
/// - Same idempotency and conflict rules as [`init_logging`].
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging_from_assets(asset_root: String, log_dir: String) -> String {
    let reader = AssetReader::from_dir(asset_root);
    let config = match AppConfig::load_or_default(&reader, CONFIG_ASSET_PATH) {
        Ok(config) => config,
        Err(err) => return format!("init_logging config failed: {err}"),
    };
    match init_logging_with(&config.log_settings(log_dir.trim())) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Directory listing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetListResponse {
    pub ok: bool,
    pub items: Vec<String>,
    /// Empty on success, otherwise `invalid_path|not_found|io_error|decode_error`.
    pub error_code: String,
    pub message: String,
}

/// Text asset envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTextResponse {
    pub ok: bool,
    pub text: Option<String>,
    pub error_code: String,
    pub message: String,
}

/// One `key=value` pair of a properties asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

/// Properties asset envelope; entries are ordered by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfigResponse {
    pub ok: bool,
    pub entries: Vec<ConfigEntry>,
    pub error_code: String,
    pub message: String,
}

/// One slot value of a list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSlotItem {
    pub slot: String,
    pub text: String,
}

/// One rendered list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRowItem {
    pub slots: Vec<ScreenSlotItem>,
}

/// List screen load envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLoadResponse {
    pub ok: bool,
    /// Terminal screen state (`bound|failed`) or `awaiting_response` on timeout.
    pub state: String,
    pub layout: String,
    pub rows: Vec<ScreenRowItem>,
    pub message: String,
}

/// Lists files and folders below `path` (`""` for the asset root).
#[flutter_rust_bridge::frb(sync)]
pub fn asset_list(asset_root: String, path: String) -> AssetListResponse {
    match AssetReader::from_dir(asset_root).list_paths(&path) {
        Ok(items) => AssetListResponse {
            ok: true,
            message: format!("Found {} item(s).", items.len()),
            items,
            error_code: String::new(),
        },
        Err(err) => AssetListResponse {
            ok: false,
            items: Vec::new(),
            error_code: err.code().to_string(),
            message: format!("asset_list failed: {err}"),
        },
    }
}

/// Returns whether an asset file exists at `path`.
#[flutter_rust_bridge::frb(sync)]
pub fn asset_exists(asset_root: String, path: String) -> bool {
    AssetReader::from_dir(asset_root).exists(&path)
}

/// Returns the asset byte length, or `None` when it cannot be determined.
#[flutter_rust_bridge::frb(sync)]
pub fn asset_size(asset_root: String, path: String) -> Option<u64> {
    AssetReader::from_dir(asset_root).size_of(&path).ok()
}

/// Reads a UTF-8 text asset.
#[flutter_rust_bridge::frb(sync)]
pub fn asset_read_text(asset_root: String, path: String) -> AssetTextResponse {
    match AssetReader::from_dir(asset_root).read_text(&path) {
        Ok(text) => AssetTextResponse {
            ok: true,
            text: Some(text),
            error_code: String::new(),
            message: String::new(),
        },
        Err(err) => AssetTextResponse {
            ok: false,
            text: None,
            error_code: err.code().to_string(),
            message: failure_message("asset_read_text", &err),
        },
    }
}

/// Reads a properties asset into key-ordered entries.
#[flutter_rust_bridge::frb(sync)]
pub fn asset_read_config(asset_root: String, path: String) -> AssetConfigResponse {
    match AssetReader::from_dir(asset_root).read_config(&path) {
        Ok(properties) => AssetConfigResponse {
            ok: true,
            entries: properties
                .into_map()
                .into_iter()
                .map(|(key, value)| ConfigEntry { key, value })
                .collect(),
            error_code: String::new(),
            message: String::new(),
        },
        Err(err) => AssetConfigResponse {
            ok: false,
            entries: Vec::new(),
            error_code: err.code().to_string(),
            message: failure_message("asset_read_config", &err),
        },
    }
}

/// Loads one built-in list screen (`goods_type|leave_message`).
///
/// # FFI contract
/// - Async on the Dart side; blocks a worker until the screen settles or
///   the configured HTTP timeout elapses.
/// - Endpoints and timeout come from `xbase.properties` under `asset_root`
///   when present, defaults otherwise.
/// - Never panics.
pub fn screen_load(screen: String, asset_root: Option<String>) -> ScreenLoadResponse {
    let config = match asset_root {
        Some(root) => {
            let reader = AssetReader::from_dir(root);
            match AppConfig::load_or_default(&reader, CONFIG_ASSET_PATH) {
                Ok(config) => config,
                Err(err) => return screen_failure(format!("screen_load config failed: {err}")),
            }
        }
        None => AppConfig::default(),
    };

    if let Some((active, _)) = logging_status() {
        if active != config.log_level {
            warn!(
                "event=screen_load module=ffi status=level_mismatch active={} configured={}",
                active, config.log_level
            );
        }
    }

    let Some(spec) = builtin_screen(&screen, &config) else {
        warn!("event=screen_load module=ffi status=error error_code=unknown_screen");
        return screen_failure(format!("screen_load failed: unknown screen `{screen}`"));
    };
    let client = match ReqwestHttpClient::from_config(&config) {
        Ok(client) => client,
        Err(err) => return screen_failure(format!("screen_load client failed: {err}")),
    };

    let mut list_screen = ListScreen::new(spec);
    list_screen.on_view_created(Arc::new(client));
    // Worker has its own request timeout; allow a small margin on top.
    let state = list_screen.wait(config.http_timeout + Duration::from_secs(1));

    match state {
        ScreenState::Bound(adapter) => ScreenLoadResponse {
            ok: true,
            state: state.label().to_string(),
            layout: adapter.layout().to_string(),
            rows: adapter.rows().iter().map(to_screen_row).collect(),
            message: format!("Loaded {} row(s).", adapter.count()),
        },
        ScreenState::Failed(err) => ScreenLoadResponse {
            message: format!("screen_load failed: {err}"),
            ..screen_failure_in(state.label())
        },
        other => ScreenLoadResponse {
            message: "screen_load timed out.".to_string(),
            ..screen_failure_in(other.label())
        },
    }
}

fn failure_message(operation: &str, err: &AssetError) -> String {
    format!("{operation} failed: {err}")
}

fn screen_failure(message: String) -> ScreenLoadResponse {
    ScreenLoadResponse {
        message,
        ..screen_failure_in("failed")
    }
}

fn screen_failure_in(state: &str) -> ScreenLoadResponse {
    ScreenLoadResponse {
        ok: false,
        state: state.to_string(),
        layout: String::new(),
        rows: Vec::new(),
        message: String::new(),
    }
}

fn to_screen_row(row: &ListRow) -> ScreenRowItem {
    ScreenRowItem {
        slots: row
            .slots
            .iter()
            .map(|value| ScreenSlotItem {
                slot: value.slot.clone(),
                text: value.text.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        asset_exists, asset_list, asset_read_config, asset_read_text, asset_size, core_version,
        init_logging, init_logging_from_assets, ping, screen_load,
    };
    use std::fs;

    fn asset_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp asset root");
        fs::create_dir_all(dir.path().join("fonts")).expect("create fonts dir");
        fs::write(dir.path().join("fonts/zh.ttf"), vec![0u8; 1024]).expect("write font");
        fs::write(dir.path().join("hello.txt"), "你好").expect("write text");
        fs::write(dir.path().join("app.properties"), "b=2\na=1\n").expect("write config");
        dir
    }

    fn root_string(dir: &tempfile::TempDir) -> String {
        dir.path().to_str().expect("utf-8 temp path").to_string()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_from_assets_validates_configured_level() {
        let dir = asset_root();
        fs::write(dir.path().join("xbase.properties"), "log.level=verbose\n")
            .expect("write config");
        let error = init_logging_from_assets(root_string(&dir), "/tmp/xbase-logs".to_string());
        assert!(error.contains("log.level"), "{error}");

        fs::write(dir.path().join("xbase.properties"), "log.level=error\n")
            .expect("write config");
        let error = init_logging_from_assets(root_string(&dir), "relative/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn asset_calls_report_content_and_size() {
        let dir = asset_root();
        let root = root_string(&dir);

        let listing = asset_list(root.clone(), String::new());
        assert!(listing.ok, "{}", listing.message);
        assert_eq!(listing.items, vec!["app.properties", "fonts", "hello.txt"]);

        assert!(asset_exists(root.clone(), "fonts/zh.ttf".to_string()));
        assert_eq!(asset_size(root.clone(), "fonts/zh.ttf".to_string()), Some(1024));
        assert_eq!(asset_size(root.clone(), "fonts/none.ttf".to_string()), None);

        let text = asset_read_text(root.clone(), "hello.txt".to_string());
        assert_eq!(text.text.as_deref(), Some("你好"));

        let config = asset_read_config(root, "app.properties".to_string());
        assert!(config.ok);
        let keys: Vec<_> = config.entries.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn asset_failures_carry_error_codes() {
        let dir = asset_root();
        let root = root_string(&dir);

        let missing = asset_read_text(root.clone(), "missing.txt".to_string());
        assert!(!missing.ok);
        assert_eq!(missing.text, None);
        assert_eq!(missing.error_code, "not_found");

        let escaped = asset_list(root, "../".to_string());
        assert!(!escaped.ok);
        assert_eq!(escaped.error_code, "invalid_path");
    }

    #[test]
    fn screen_load_rejects_unknown_screen() {
        let response = screen_load("settings".to_string(), None);
        assert!(!response.ok);
        assert_eq!(response.state, "failed");
        assert!(response.message.contains("unknown screen"));
    }

    #[test]
    fn screen_load_surfaces_invalid_config() {
        let dir = asset_root();
        fs::write(dir.path().join("xbase.properties"), "http.timeout_ms=soon\n")
            .expect("write config");

        let response = screen_load("goods_type".to_string(), Some(root_string(&dir)));
        assert!(!response.ok);
        assert!(response.message.contains("http.timeout_ms"));
    }
}
