use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置 - 区域导航服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖（启动时先加载 `.env`）：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、上传文件、日志) |
/// | DATABASE_URL | sqlite:{WORK_DIR}/zones.db | SQLite 连接串 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 未设置 RUST_LOG 时的日志级别 |
/// | LOG_JSON | 生产环境为 true | JSON 日志格式 |
/// | PUBLIC_BASE_URL | http://localhost:{HTTP_PORT} | 图片 URL 前缀 |
/// | MAX_UPLOAD_BYTES | 10485760 | 图片上传大小上限 |
/// | DETECTION_PROGRAM | detect-apartments | 区域识别可执行程序 |
/// | DETECTION_ARGS | (空) | 识别程序的前置参数 (空格分隔) |
/// | DETECTION_TIMEOUT_SECS | 120 | 识别进程超时(秒) |
/// | DETECTION_TEMP_DIR | 系统临时目录 | 识别输入文件的暂存目录 |
/// | PREFETCH_FLOOR_COUNT | 5 | 楼栋视图返回的预加载楼层数 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/zones HTTP_PORT=8080 cargo run -p zone-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、上传文件、日志
    pub work_dir: PathBuf,
    pub database_url: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    /// 对外可访问的服务地址，用于拼接图片 URL
    pub public_base_url: String,
    pub max_upload_bytes: usize,

    // === 区域识别 ===
    pub detection_program: String,
    pub detection_args: Vec<String>,
    pub detection_timeout_secs: u64,
    pub detection_temp_dir: Option<PathBuf>,

    // === 导航 ===
    pub prefetch_floor_count: u32,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let work_dir = PathBuf::from(std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()));
        let http_port = env_or("HTTP_PORT", 3000u16);
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| {
                format!("sqlite:{}", work_dir.join("zones.db").display())
            }),
            http_port,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", is_production),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            detection_program: std::env::var("DETECTION_PROGRAM")
                .unwrap_or_else(|_| "detect-apartments".into()),
            detection_args: std::env::var("DETECTION_ARGS")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            detection_timeout_secs: env_or("DETECTION_TIMEOUT_SECS", 120),
            detection_temp_dir: std::env::var("DETECTION_TEMP_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            prefetch_floor_count: env_or("PREFETCH_FLOOR_COUNT", 5),
            environment,
            work_dir,
        }
    }

    /// 使用自定义工作目录覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<PathBuf>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_url = format!("sqlite:{}", config.work_dir.join("zones.db").display());
        config.http_port = http_port;
        config.public_base_url = format!("http://localhost:{http_port}");
        config
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        if let Some(dir) = &self.detection_temp_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// 上传文件根目录
    pub fn uploads_dir(&self) -> PathBuf {
        self.work_dir.join("uploads")
    }

    /// 日志目录
    pub fn logs_dir(&self) -> PathBuf {
        self.work_dir.join("logs")
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.detection_timeout_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
