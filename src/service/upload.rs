use crate::error::ServiceError;
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// 同名文件已存在时的最大重试次数
const MAX_NAME_ATTEMPTS: usize = 16;

/// 进程内上传序号, 同一毫秒内的并发上传靠它区分
static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// 只接受 .xlsx / .xls (不区分大小写)
pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// 文件名净化: 去掉目录部分, 空白转下划线, 仅保留字母数字与 . - _
pub fn secure_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']);

    if allowed_file(trimmed) {
        trimmed.to_string()
    } else {
        // 名称被清空时保留扩展名
        let ext = extension_of(filename).unwrap_or_else(|| ALLOWED_EXTENSIONS[0].to_string());
        format!("upload.{ext}")
    }
}

/// 时间戳 (毫秒) + 序号前缀
pub fn timestamped_name(filename: &str, now: DateTime<Local>, seq: u64) -> String {
    format!(
        "{}_{:04}_{}",
        now.format("%Y%m%d_%H%M%S_%3f"),
        seq,
        secure_filename(filename)
    )
}

/// 校验并保存上传文件, 返回 (保存的文件名, 完整路径)
pub async fn store_upload(
    upload_dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> Result<(String, PathBuf), ServiceError> {
    if filename.trim().is_empty() {
        return Err(ServiceError::InvalidUpload("No file selected".to_string()));
    }
    if !allowed_file(filename) {
        return Err(ServiceError::InvalidUpload(
            "Invalid file type. Only .xlsx and .xls allowed".to_string(),
        ));
    }
    if bytes.is_empty() {
        return Err(ServiceError::InvalidUpload("Uploaded file is empty".to_string()));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(ServiceError::Storage)?;

    let mut attempt = 0;
    let (stored_name, path, mut file) = loop {
        let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
        let stored_name = timestamped_name(filename, Local::now(), seq);
        let path = upload_dir.join(&stored_name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => break (stored_name, path, file),
            // 序号在进程重启后归零, 可能撞上旧文件
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt + 1 < MAX_NAME_ATTEMPTS => {
                tracing::debug!("Upload name {} taken, retrying", stored_name);
                attempt += 1;
            }
            Err(e) => return Err(ServiceError::Storage(e)),
        }
    };
    file.write_all(bytes).await.map_err(ServiceError::Storage)?;
    file.flush().await.map_err(ServiceError::Storage)?;

    tracing::info!("Stored upload '{}' ({} bytes) as {}", filename, bytes.len(), path.display());
    Ok((stored_name, path))
}
