use std::path::PathBuf;
use thiserror::Error;

/// 对账转换错误
#[derive(Debug, Error)]
pub enum TransformError {
    /// 源文件不存在
    #[error("source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// 缺少必需的工作表
    #[error("missing required sheet '{sheet}'")]
    MissingSheet { sheet: String },

    /// 工作表缺少必需的列
    #[error("sheet '{sheet}': missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    /// 单元格值无法解析为声明的类型
    #[error("sheet '{sheet}', row {row}, column '{column}': cannot parse {expected} from '{value}'")]
    InvalidValue {
        sheet: String,
        /// 工作表中的行号 (1 起)
        row: usize,
        column: String,
        expected: &'static str,
        value: String,
    },

    /// 工作簿无法打开或读取
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// 是否属于工作簿结构问题 (调用方输入错误)
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MissingSheet { .. } | Self::MissingColumn { .. })
    }
}

/// 服务层错误 (上传、超时、后台任务)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// 上传文件名或类型不合法
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("reconciliation did not finish within {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to store upload: {0}")]
    Storage(#[source] std::io::Error),

    #[error("reconciliation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
