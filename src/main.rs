use deduction_recon::{api, AppConfig, ReconService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间, 默认 info, 可用 RUST_LOG 覆盖
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    let service = Arc::new(ReconService::new(&config.source, &config.processing));
    if !service.default_file().exists() {
        info!("默认文件不存在, 处理默认文件的接口将返回 404: {}", service.default_file().display());
    }

    let app = api::router(service, config.source.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/health                     - 健康检查");
    info!("  GET  /api/process-default            - 默认文件 (发票级)");
    info!("  POST /api/upload-and-process         - 上传并对账 (行级)");
    info!("  GET  /api/summary                    - 汇总统计");
    info!("  POST /api/filter                     - 条件过滤");
    info!("  GET  /api/disputable-items           - 可争议项");
    info!("  GET  /api/monthly-trends             - 月度趋势");
    info!("  GET  /api/variance-by-classification - 按结论差异");
    info!("  GET  /api/export                     - CSV 导出");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
