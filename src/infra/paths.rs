// src/infra/paths.rs — Config and data path resolution
//
// LIFTLOOP_HOME overrides everything: config.toml and data/ live beneath it.
// Otherwise config goes to the platform config dir and data to the local data dir.

use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "liftloop")
}

/// Returns the LIFTLOOP_HOME override, if set.
fn liftloop_home() -> Option<PathBuf> {
    std::env::var_os("LIFTLOOP_HOME").map(PathBuf::from)
}

/// Configuration directory: $LIFTLOOP_HOME/ or the platform config dir.
/// Falls back to `./.liftloop` when no home directory can be determined.
pub fn config_dir() -> PathBuf {
    if let Some(home) = liftloop_home() {
        return home;
    }
    project_dirs()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".liftloop"))
}

/// Data directory: $LIFTLOOP_HOME/data/ or the platform local data dir.
pub fn data_dir() -> PathBuf {
    if let Some(home) = liftloop_home() {
        return home.join("data");
    }
    project_dirs()
        .map(|d| d.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".liftloop").join("data"))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Resolve a configured data file. Absolute paths and paths that exist
/// relative to the working directory are used as-is; anything else is
/// looked up under the data directory.
pub fn resolve_data_file(configured: &str) -> PathBuf {
    let p = PathBuf::from(configured);
    if p.is_absolute() || p.exists() {
        return p;
    }
    data_dir().join(p)
}
