//! Files kept in the data directory

use crate::error::{MarketError, Result};
use std::path::{Path, PathBuf};

/// Directory name under `$HOME` when none is configured
pub const DATA_DIR_NAME: &str = ".tickerwatch";
pub const KEY_FILE_NAME: &str = "finnhub.key";
pub const SYMBOL_IDS_FILE_NAME: &str = "symbol_ids.json";

/// Locations of the program's local files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use `configured`, or `$HOME/.tickerwatch`
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        if let Some(root) = configured {
            return Ok(Self::new(root));
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(MarketError::MissingHome)?;
        Ok(Self::new(PathBuf::from(home).join(DATA_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_file(&self) -> PathBuf {
        self.root.join(KEY_FILE_NAME)
    }

    pub fn symbol_ids_file(&self) -> PathBuf {
        self.root.join(SYMBOL_IDS_FILE_NAME)
    }

    /// Create the directory if it does not exist yet
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn read_api_key(&self) -> Result<String> {
        load_api_key(self.key_file())
    }

    pub fn write_api_key(&self, key: &str) -> Result<()> {
        self.ensure()?;
        std::fs::write(self.key_file(), key.trim())?;
        tracing::info!(path = %self.key_file().display(), "Stored API key");
        Ok(())
    }
}

/// Read an API key: the first whitespace-separated token of the file
pub fn load_api_key(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MarketError::MissingKey(path.to_path_buf()),
        _ => MarketError::Io(e),
    })?;

    content
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| MarketError::EmptyKey(path.to_path_buf()))
}
