use super::reconcile::reconcile;
use crate::error::TransformError;
use crate::models::ReconciledDataset;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// 文件指纹: 长度 + 修改时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl Fingerprint {
    pub fn of(path: &Path) -> Result<Self, TransformError> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransformError::MissingFile(path.to_path_buf()),
            _ => TransformError::Io(e),
        })?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedDataset {
    fingerprint: Fingerprint,
    dataset: Arc<ReconciledDataset>,
}

/// 对账结果缓存, 文件未变化时复用上次结果
#[derive(Debug, Default)]
pub struct DatasetCache {
    enabled: bool,
    entries: DashMap<PathBuf, CachedDataset>,
}

impl DatasetCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn get_or_reconcile(&self, path: &Path) -> Result<Arc<ReconciledDataset>, TransformError> {
        if !self.enabled {
            return reconcile(path).map(Arc::new);
        }

        let fingerprint = Fingerprint::of(path)?;
        // 读锁需在写入前释放
        if let Some(entry) = self.entries.get(path) {
            if entry.fingerprint == fingerprint {
                tracing::debug!("Cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(reconcile(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedDataset {
                fingerprint,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
