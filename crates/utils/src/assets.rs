use std::{io, path::PathBuf};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "GUILD_ASSET_DIR";
const DATABASE_FILE: &str = "guild.sqlite";

/// Directory holding local state such as the default sqlite database.
/// `GUILD_ASSET_DIR` wins when set; debug builds use `dev_assets/` in the
/// workspace, release builds the platform data directory.
pub fn asset_dir() -> io::Result<PathBuf> {
    let path = match std::env::var(ASSET_DIR_ENV) {
        Ok(override_dir) if !override_dir.trim().is_empty() => PathBuf::from(override_dir.trim()),
        _ if cfg!(debug_assertions) => PathBuf::from(PROJECT_ROOT).join("../../dev_assets"),
        _ => ProjectDirs::from("org", "guild", "guild-payouts")
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?
            .data_dir()
            .to_path_buf(),
    };

    if !path.exists() {
        std::fs::create_dir_all(&path)?;
        tracing::debug!(path = %path.display(), "Created asset directory");
    }
    Ok(path)
}

pub fn database_path() -> io::Result<PathBuf> {
    Ok(asset_dir()?.join(DATABASE_FILE))
}

/// Sqlite url for the default database file, created on first connect.
pub fn default_database_url() -> io::Result<String> {
    Ok(format!(
        "sqlite://{}?mode=rwc",
        database_path()?.to_string_lossy()
    ))
}
