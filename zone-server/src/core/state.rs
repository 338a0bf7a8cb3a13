use std::sync::Arc;

use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};

use crate::catalogue::{CATALOGUE_DOMAIN, CatalogueCache, CatalogueService};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{ApartmentRepository, ZoneRepository};
use crate::detection::DetectionGateway;
use crate::images::{ImageStore, LocalImageStore, ZoneImageManager};
use crate::navigation::{NavigationCache, NavigationResolver};

/// 资源版本管理器
///
/// 每个缓存域一个单调递增的版本号，版本号嵌入缓存键，
/// 递增即令该域的旧缓存全部失效。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的单例引用
///
/// 所有字段都是浅拷贝 (Arc / 连接池句柄)，可以直接作为 axum state。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | resource_versions | Arc<ResourceVersions> | 缓存版本管理 |
/// | image_store | Arc<dyn ImageStore> | 图片对象存储 |
/// | navigation | NavigationCache | 导航视图缓存 |
/// | catalogue | CatalogueService | 房源列表 (版本轮换缓存) |
/// | zones | ZoneRepository | 区域写入 |
/// | apartments | ApartmentRepository | 房源写入 |
/// | images | ZoneImageManager | 层级底图管理 |
/// | detection | DetectionGateway | 区域识别进程 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub resource_versions: Arc<ResourceVersions>,
    pub image_store: Arc<dyn ImageStore>,
    pub navigation: NavigationCache,
    pub catalogue: CatalogueService,
    pub zones: ZoneRepository,
    pub apartments: ApartmentRepository,
    pub images: ZoneImageManager,
    pub detection: DetectionGateway,
}

impl ServerState {
    /// 用已打开的数据库组装所有服务
    pub fn new(config: Config, db: DbService) -> Self {
        let pool = db.pool.clone();
        let resource_versions = Arc::new(ResourceVersions::new());
        let image_store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
            config.uploads_dir(),
            config.public_base_url.clone(),
        ));

        let resolver =
            NavigationResolver::new(pool.clone(), image_store.clone(), config.prefetch_floor_count);
        let navigation = NavigationCache::new(resolver);
        let catalogue_cache = Arc::new(CatalogueCache::new(
            CATALOGUE_DOMAIN,
            resource_versions.clone(),
        ));

        Self {
            catalogue: CatalogueService::new(pool.clone(), catalogue_cache.clone()),
            zones: ZoneRepository::new(pool.clone(), navigation.clone()),
            apartments: ApartmentRepository::new(pool.clone(), navigation.clone(), catalogue_cache),
            images: ZoneImageManager::new(
                pool,
                image_store.clone(),
                navigation.clone(),
                config.max_upload_bytes,
            ),
            detection: DetectionGateway::from_config(&config),
            navigation,
            image_store,
            resource_versions,
            db,
            config,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构 (work_dir/uploads, work_dir/logs)
    /// 2. 数据库 (DATABASE_URL) 与迁移
    /// 3. 各服务
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        config.ensure_work_dir_structure().map_err(|e| {
            AppError::with_message(
                ErrorCode::ConfigError,
                format!("Failed to create work directory structure: {e}"),
            )
        })?;

        let db = DbService::new(&config.database_url).await?;
        Ok(Self::new(config.clone(), db))
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}
