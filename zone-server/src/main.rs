use zone_server::error::BoxError;
use zone_server::{Config, Server, ServerState, init_logger, print_banner};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. 加载 .env
    dotenvy::dotenv().ok();

    // 2. 加载配置
    let config = Config::from_env();

    // 3. 日志 (控制台 + 文件)
    let logs_dir = config.logs_dir();
    std::fs::create_dir_all(&logs_dir)?;
    init_logger(&config.log_level, config.log_json, Some(&logs_dir))?;

    print_banner();
    tracing::info!(work_dir = %config.work_dir.display(), "Zone server starting...");

    // 4. 初始化服务器状态
    let state = ServerState::initialize(&config).await?;

    // 5. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
