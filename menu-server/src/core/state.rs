use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{PublishCoordinator, SessionRegistry};
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{AssignmentSource, CatalogRecordStore, RedbCatalogStore};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Arc<dyn CatalogRecordStore> | 商品行存储 |
/// | assignments | Arc<dyn AssignmentSource> | 专属饮品分配 (只读) |
/// | sessions | Arc<SessionRegistry> | 编辑会话注册表 |
/// | publisher | Arc<PublishCoordinator> | 发布单飞锁 (所有会话共享) |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    pub store: Arc<dyn CatalogRecordStore>,
    pub assignments: Arc<dyn AssignmentSource>,
    pub sessions: Arc<SessionRegistry>,
    pub publisher: Arc<PublishCoordinator>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 使用已打开的存储构造状态 (测试常用)
    pub fn with_store(config: Config, store: RedbCatalogStore) -> Self {
        let assignments: Arc<dyn AssignmentSource> = Arc::new(store.clone());
        Self::from_parts(config, Arc::new(store), assignments)
    }

    /// 使用任意存储实现构造状态
    pub fn from_parts(
        config: Config,
        store: Arc<dyn CatalogRecordStore>,
        assignments: Arc<dyn AssignmentSource>,
    ) -> Self {
        Self {
            config,
            sessions: Arc::new(SessionRegistry::new(store.clone())),
            store,
            assignments,
            publisher: Arc::new(PublishCoordinator::new()),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 数据库 (work_dir/DATABASE_FILE)
    /// 3. 会话注册表、发布协调器
    pub fn initialize(config: &Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            AppError::internal(format!("Failed to create work dir {}: {e}", config.work_dir))
        })?;

        let db = DbService::new(&config.database_path())?;
        Ok(Self::with_store(config.clone(), db.store))
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
