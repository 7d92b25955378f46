//! Runtime configuration from environment variables

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "MIZAN_DATA_DIR";
pub const BIND_VAR: &str = "MIZAN_BIND";
pub const SEED_DIR_VAR: &str = "MIZAN_SEED_DIR";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DB_FILE: &str = "mizan.db";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Optional directory of seed text files used when the database is empty
    pub seed_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = std::env::var_os(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let bind = std::env::var(BIND_VAR).unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid {} value {:?}: {}", BIND_VAR, bind, e))?;

        let seed_dir = std::env::var_os(SEED_DIR_VAR).map(PathBuf::from);

        Ok(Self {
            data_dir,
            bind_addr,
            seed_dir,
        })
    }

    /// Config rooted at `data_dir` with default bind address and bundled seeds
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            seed_dir: None,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

/// Default data directory.
///
/// Debug builds prefer a `data` folder in the working directory that already
/// holds a database. Otherwise the platform data directory is used, falling
/// back to `./data`.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        let dev_path = PathBuf::from("data");
        if dev_path.join(DB_FILE).exists() {
            return dev_path;
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("mizan");
    }

    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path() {
        let config = Config::with_data_dir(Path::new("/tmp/mizan-test"));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/mizan-test/mizan.db"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.seed_dir.is_none());
    }
}
