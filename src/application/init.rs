//! Initialize diary use case

use crate::error::Result;
use crate::infrastructure::{Config, DiaryWorkspace};
use log::info;
use std::fs;
use std::path::Path;

/// Initialize a new diary at the specified path.
pub fn init(path: &Path) -> Result<DiaryWorkspace> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let workspace = DiaryWorkspace::new(path.to_path_buf());
    workspace.initialize()?;
    workspace.save_config(&Config::default())?;

    info!("Initialized diary at {}", path.display());
    Ok(workspace)
}
