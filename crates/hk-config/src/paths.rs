use std::path::PathBuf;

/// XDG app name used for config and state directories.
pub const APP_NAME: &str = "homekeep";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ITEMS_FILE_NAME: &str = "pending_items.json";
pub const POOL_LOG_FILE_NAME: &str = "pool_log.jsonl";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// `~/.config/homekeep/config.toml`, if a home directory can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Directory holding the items document and the pool log.
///
/// Prefers the XDG state dir, then the local data dir (macOS, Windows), and
/// falls back to the temp dir when no home directory exists (containers).
pub fn state_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.data_local_dir())
                .to_path_buf()
        })
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}
