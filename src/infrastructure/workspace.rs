//! Diary root discovery and on-disk layout

use crate::error::{DiaryError, Result};
use crate::infrastructure::config::{Config, DIARY_DIR};
use crate::infrastructure::store::{FileKeyValueStore, PersistentEntryStore};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a diary root
pub const ENV_ROOT: &str = "AIDIARY_ROOT";

/// A directory containing `.aidiary/`
#[derive(Debug, Clone)]
pub struct DiaryWorkspace {
    pub root: PathBuf,
}

impl DiaryWorkspace {
    pub fn new(root: PathBuf) -> Self {
        DiaryWorkspace { root }
    }

    /// Discover the diary root.
    /// First checks AIDIARY_ROOT, then walks up from the current directory.
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var(ENV_ROOT) {
            let path = PathBuf::from(root_path);
            if Self::has_diary_dir(&path) {
                return Ok(DiaryWorkspace::new(path));
            } else {
                return Err(DiaryError::Config(format!(
                    "{} is set to '{}' but no {} directory found. \
                    Run 'aidiary init' in that directory or unset {}.",
                    ENV_ROOT,
                    path.display(),
                    DIARY_DIR,
                    ENV_ROOT
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Walk up from `start` until a directory with `.aidiary/` is found
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_diary_dir(&current) {
                return Ok(DiaryWorkspace::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(DiaryError::NotDiaryDirectory(start.to_path_buf())),
            }
        }
    }

    fn has_diary_dir(path: &Path) -> bool {
        path.join(DIARY_DIR).is_dir()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_initialized(&self) -> bool {
        Self::has_diary_dir(&self.root)
    }

    /// Create the `.aidiary` directory; fails if it already exists
    pub fn initialize(&self) -> Result<()> {
        let diary_dir = self.root.join(DIARY_DIR);

        if diary_dir.exists() {
            return Err(DiaryError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&diary_dir)?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    /// Entry log stored under this workspace
    pub fn entry_store(&self) -> PersistentEntryStore<FileKeyValueStore> {
        PersistentEntryStore::new(FileKeyValueStore::in_diary(&self.root))
    }
}
