use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::{self, LoadError};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Source signature
// ---------------------------------------------------------------------------

/// What identifies one version of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Signature {
    modified: Option<SystemTime>,
    len: u64,
}

impl Signature {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|e| LoadError::DataUnavailable {
            source_name: path.display().to_string(),
            cause: e.into(),
        })?;
        Ok(Signature {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// DatasetCache
// ---------------------------------------------------------------------------

/// Memoizes loaded datasets per path. Owned by the caller; there is no
/// process-wide instance. Returned datasets are shared and must be treated
/// as read-only.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, (Signature, Arc<Dataset>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path` if the file is unchanged,
    /// otherwise (re)load it.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let signature = Signature::of(path)?;
        if let Some((cached, dataset)) = self.entries.get(path) {
            if *cached == signature {
                log::debug!("Dataset cache hit for {}", path.display());
                return Ok(Arc::clone(dataset));
            }
            log::debug!("{} changed on disk, reloading", path.display());
        }

        let dataset = Arc::new(loader::load_file(path)?);
        self.entries
            .insert(path.to_path_buf(), (signature, Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Forget the entry for one path.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
