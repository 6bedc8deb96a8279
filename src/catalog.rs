use crate::params::ParameterStore;
use crate::registry::is_volatile_key;
use crate::snapshot::{SettingsSnapshot, SnapshotError};
use std::path::PathBuf;
use tracing::info;

/// Width of the remote's snapshot grid; `(row, col)` maps to `(row-1)*6 + col`.
pub const GRID_COLUMNS: usize = 6;

const STEM: &str = "settings";
const EXTENSION: &str = "txt";

/// Numbered snapshots `settings<N>.txt` (N >= 1) plus the base `settings.txt`
/// in one directory. Nothing is cached: every query looks at the disk.
#[derive(Debug, Clone)]
pub struct SnapshotCatalog {
    dir: PathBuf,
}

impl SnapshotCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{STEM}{index}.{EXTENSION}"))
    }

    pub fn base_path(&self) -> PathBuf {
        self.dir.join(format!("{STEM}.{EXTENSION}"))
    }

    pub fn exists(&self, index: usize) -> bool {
        index >= 1 && self.path_for(index).is_file()
    }

    /// Highest N such that 1..=N all exist.
    pub fn count(&self) -> usize {
        let mut n = 0usize;
        while self.exists(n + 1) {
            n += 1;
        }
        n
    }

    /// Round-robin successor: `current + 1` when present, otherwise 1.
    pub fn next_index_after(&self, current: usize) -> usize {
        let next = current.saturating_add(1);
        if self.exists(next) { next } else { 1 }
    }

    pub fn load(&self, index: usize) -> Result<SettingsSnapshot, SnapshotError> {
        if index == 0 {
            return Err(SnapshotError::NotFound(self.path_for(index)));
        }
        SettingsSnapshot::load(self.path_for(index))
    }

    pub fn load_base(&self) -> Result<SettingsSnapshot, SnapshotError> {
        SettingsSnapshot::load(self.base_path())
    }

    pub fn save_base(&self, store: &ParameterStore) -> Result<(), SnapshotError> {
        let path = self.base_path();
        SettingsSnapshot::capture(path.display().to_string(), store, |_| true).save(&path)
    }

    /// Saves the live store under the first free index and returns it.
    pub fn save_new(&self, store: &ParameterStore) -> Result<usize, SnapshotError> {
        let mut index = 1usize;
        while self.path_for(index).exists() {
            index += 1;
        }
        let path = self.path_for(index);
        SettingsSnapshot::capture(path.display().to_string(), store, |key| {
            !is_volatile_key(key)
        })
        .save(&path)?;
        info!(index, path = %path.display(), "saved new settings snapshot");
        Ok(index)
    }

    /// Strips session-only keys out of every numbered snapshot. Returns how
    /// many files were rewritten.
    pub fn clean(&self) -> Result<usize, SnapshotError> {
        let mut rewritten = 0usize;
        for index in 1..=self.count() {
            let snap = self.load(index)?;
            let cleaned = snap.retain(|key| !is_volatile_key(key));
            if cleaned.len() != snap.len() {
                cleaned.save(self.path_for(index))?;
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}

/// 1-based grid cell to snapshot index; `None` for row or column 0 or a
/// column past the grid width.
pub fn index_for_cell(row: usize, col: usize) -> Option<usize> {
    if row == 0 || col == 0 || col > GRID_COLUMNS {
        return None;
    }
    row.checked_sub(1)?
        .checked_mul(GRID_COLUMNS)?
        .checked_add(col)
}
