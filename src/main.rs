use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quicklaunch_core::core::ConfigStore;
use quicklaunch_core::tui_main;

const LOG_FILE: &str = "quicklaunch.log";

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if matches!(args.get(1).map(String::as_str), Some("-h" | "--help")) {
        println!("usage: quicklaunch [CONFIG_PATH]");
        println!();
        println!("Config location: CONFIG_PATH, then $QUICKLAUNCH_CONFIG, then");
        println!("{}", ConfigStore::default_path().display());
        return Ok(());
    }

    let store = ConfigStore::locate(args.get(1).map(PathBuf::from));
    init_logging(store.path())?;
    info!(path = %store.path().display(), "starting quicklaunch");

    // First run: seed the user config from the bundled template.
    if let Err(e) = store.bootstrap(&ConfigStore::bundled_template()) {
        warn!("could not seed config from template: {}", e);
    }

    tui_main::run(store)
}

/// Log to a file beside the config; the terminal belongs to the UI.
fn init_logging(config_path: &Path) -> anyhow::Result<()> {
    let dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config directory {}", dir.display()))?;
    let log_path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
    Ok(())
}
