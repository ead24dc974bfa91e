// ============================================
// FontFlow - scratch.rs
// ============================================
// Temporary extraction folders.
//
// Every installation run extracts fonts into its own folder:
//
//   %TEMP%/
//   └── fontflow_<uuid>/
//       ├── 000/          # fonts from the first archive
//       └── 001/          # fonts from the second archive
//
// The folder is owned by a ScratchDir guard. When the guard goes out of
// scope (normal completion, early return, or panic unwinding), Drop
// removes the whole folder, so nothing is left behind in %TEMP%.
// ============================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// RAII guard for a run's scratch folder. Removes the folder on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh, uniquely named folder under `parent`.
    pub fn create_in(parent: &Path) -> Result<Self> {
        let path = parent.join(format!("fontflow_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create scratch folder {}", path.display()))?;
        log::debug!("[Scratch] Created {}", path.display());
        Ok(ScratchDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        // Best-effort - we're in drop, so we can't return errors
        match fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("[Scratch] Removed {}", self.path.display()),
            Err(e) => log::warn!(
                "[Scratch] Could not remove {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
