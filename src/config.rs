use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 默认配置文件名 (可通过 RECON_CONFIG 覆盖)
pub const CONFIG_FILE: &str = "deduction-recon.toml";
/// 环境变量前缀, 嵌套字段用双下划线分隔, 如 RECON_SERVER__PORT
pub const ENV_PREFIX: &str = "RECON";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 源文件与上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub default_file: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub request_timeout_secs: u64,
    pub cache_enabled: bool,
}

impl ProcessingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5001,
            },
            source: SourceConfig {
                default_file: PathBuf::from("AMZN_NETSUITE_POs_SOs_Mapping 1.xlsx"),
                upload_dir: PathBuf::from("uploads"),
                max_upload_bytes: 16 * 1024 * 1024,
            },
            processing: ProcessingConfig {
                request_timeout_secs: 30,
                cache_enabled: true,
            },
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 < 配置文件 (可选) < 环境变量
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let file = std::env::var(format!("{ENV_PREFIX}_CONFIG")).unwrap_or_else(|_| CONFIG_FILE.to_string());
        Self::load(&file, config::Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load(file: &str, env: config::Environment) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("source.default_file", defaults.source.default_file.display().to_string())?
            .set_default("source.upload_dir", defaults.source.upload_dir.display().to_string())?
            .set_default("source.max_upload_bytes", defaults.source.max_upload_bytes as i64)?
            .set_default("processing.request_timeout_secs", defaults.processing.request_timeout_secs as i64)?
            .set_default("processing.cache_enabled", defaults.processing.cache_enabled)?
            .add_source(config::File::with_name(file).required(false))
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
