use super::cache::DatasetCache;
use super::reconcile::reconcile;
use super::upload;
use crate::config::{ProcessingConfig, SourceConfig};
use crate::error::{ServiceError, TransformError};
use crate::models::ReconciledDataset;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// 对账服务: 默认文件 + 上传文件, 转换在阻塞线程池中执行并受超时约束
pub struct ReconService {
    default_file: PathBuf,
    upload_dir: PathBuf,
    timeout: Duration,
    cache: Arc<DatasetCache>,
}

impl ReconService {
    pub fn new(source: &SourceConfig, processing: &ProcessingConfig) -> Self {
        Self {
            default_file: source.default_file.clone(),
            upload_dir: source.upload_dir.clone(),
            timeout: processing.request_timeout(),
            cache: Arc::new(DatasetCache::new(processing.cache_enabled)),
        }
    }

    pub fn default_file(&self) -> &Path {
        &self.default_file
    }

    /// 对账默认文件 (文件未变化时复用缓存)
    pub async fn default_dataset(&self) -> Result<Arc<ReconciledDataset>, ServiceError> {
        let cache = Arc::clone(&self.cache);
        let path = self.default_file.clone();
        self.run_blocking(move || cache.get_or_reconcile(&path)).await
    }

    /// 保存上传文件并对账, 返回保存后的文件名
    pub async fn upload_and_reconcile(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(String, ReconciledDataset), ServiceError> {
        let (stored_name, path) = upload::store_upload(&self.upload_dir, filename, bytes).await?;
        let dataset = self.run_blocking(move || reconcile(&path)).await?;
        Ok((stored_name, dataset))
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Result<T, TransformError> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                tracing::error!("Reconciliation exceeded {:?}", self.timeout);
                Err(ServiceError::Timeout(self.timeout))
            }
        }
    }
}
