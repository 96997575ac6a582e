//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `xbase_core` linkage without the Flutter runtime.
//! - Optionally list an asset directory or load one built-in list screen.
//!
//! Usage: `xbase_cli [ASSET_ROOT [ASSET_PATH | --screen NAME]]`
//!
//! With an asset root, logs go to `$XBASE_LOG_DIR` (default: a temp
//! directory) at the `log.level` from `xbase.properties`; warnings are
//! mirrored to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use xbase_core::{
    builtin_screen, init_logging_with, AppConfig, AssetReader, ListScreen, ReqwestHttpClient,
    ScreenState, CONFIG_ASSET_PATH,
};

const LOG_DIR_ENV: &str = "XBASE_LOG_DIR";

fn main() -> ExitCode {
    println!("xbase_core ping={}", xbase_core::ping());
    println!("xbase_core version={}", xbase_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(root) = args.first() else {
        return ExitCode::SUCCESS;
    };
    let reader = AssetReader::from_dir(root);
    let config = match AppConfig::load_or_default(&reader, CONFIG_ASSET_PATH) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    start_logging(&config);

    let outcome = match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("--screen"), Some(name)) => load_screen(&config, name),
        (path, _) => list_assets(&reader, path.unwrap_or("")),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(config: &AppConfig) {
    let log_dir = std::env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("xbase-logs"));
    let mut settings = config.log_settings(log_dir);
    settings.mirror_to_stderr = true;
    if let Err(err) = init_logging_with(&settings) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn list_assets(reader: &AssetReader, path: &str) -> Result<(), String> {
    let names = reader.list_paths(path).map_err(|err| err.to_string())?;
    for name in names {
        let child = if path.is_empty() {
            name.clone()
        } else {
            format!("{}/{name}", path.trim_end_matches('/'))
        };
        match reader.size_of(&child) {
            Ok(size) => println!("{size:>10}  {child}"),
            Err(_) => println!("{:>10}  {child}/", "-"),
        }
    }
    Ok(())
}

fn load_screen(config: &AppConfig, name: &str) -> Result<(), String> {
    let spec = builtin_screen(name, config).ok_or_else(|| format!("unknown screen `{name}`"))?;
    let client = ReqwestHttpClient::from_config(config).map_err(|err| err.to_string())?;

    let mut screen = ListScreen::new(spec);
    screen.on_view_created(Arc::new(client));
    match screen.wait(config.http_timeout + Duration::from_secs(1)) {
        ScreenState::Bound(adapter) => {
            for row in adapter.rows() {
                let cells: Vec<&str> = row.slots.iter().map(|slot| slot.text.as_str()).collect();
                println!("{}", cells.join(" | "));
            }
            Ok(())
        }
        ScreenState::Failed(err) => Err(err.to_string()),
        other => Err(format!("screen did not settle (state={})", other.label())),
    }
}
