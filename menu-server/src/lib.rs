//! Menu Server - 菜单草稿/发布服务
//!
//! # 架构概述
//!
//! 管理员在草稿 (draft) 副本上暂存修改，顾客继续看到不受影响的线上 (live)
//! 副本；一次发布操作把草稿状态合并进线上状态。
//!
//! # 模块结构
//!
//! ```text
//! menu-server/src/
//! ├── core/          # 配置、状态、错误
//! ├── catalog/       # 视图、变更跟踪、发布、编辑会话
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志、校验、错误
//! └── db/            # redb 存储层
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use catalog::{CatalogError, EditSession, PublishCoordinator, SessionRegistry};
pub use core::{Config, Server, ServerState};
pub use db::repository::{CatalogRecordStore, RedbCatalogStore};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env，初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
    Ok(())
}
