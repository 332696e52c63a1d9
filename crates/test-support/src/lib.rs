//! Helpers shared by the workspace's tests.

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;
use utils::assets::ASSET_DIR_ENV;

/// Serializes tests that mutate process environment variables.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

pub fn temp_root(prefix: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("guild-{prefix}-"))
        .tempdir()
        .unwrap_or_else(|err| panic!("failed to create temp dir: {err}"))
}

/// File-backed sqlite url inside `root`, created on first connect.
pub fn sqlite_url(root: &Path) -> String {
    format!(
        "sqlite://{}?mode=rwc",
        root.join("db.sqlite").to_string_lossy()
    )
}

/// Points the asset directory at `root` until dropped.
pub struct AssetDirGuard {
    _lock: MutexGuard<'static, ()>,
    previous: Option<String>,
}

impl AssetDirGuard {
    pub fn new(root: &Path) -> Self {
        let lock = env_lock().lock().unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(ASSET_DIR_ENV).ok();

        // SAFETY: tests using AssetDirGuard are serialized by env_lock.
        unsafe {
            std::env::set_var(ASSET_DIR_ENV, root);
        }

        Self {
            _lock: lock,
            previous,
        }
    }
}

impl Drop for AssetDirGuard {
    fn drop(&mut self) {
        // SAFETY: tests using AssetDirGuard are serialized by env_lock.
        unsafe {
            match &self.previous {
                Some(value) => std::env::set_var(ASSET_DIR_ENV, value),
                None => std::env::remove_var(ASSET_DIR_ENV),
            }
        }
    }
}
