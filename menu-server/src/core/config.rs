use std::path::PathBuf;

use crate::core::{Result, ServerError};

/// 服务器配置 - 菜单服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/menu-server | 工作目录 |
/// | DATABASE_FILE | catalog.redb | 数据库文件 (相对 WORK_DIR，`:memory:` 为内存库) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志目录，设置后按天滚动写文件 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SESSION_IDLE_TIMEOUT_MS | 1800000 | 编辑会话空闲过期(毫秒) |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/menu HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库等文件
    pub work_dir: String,
    /// 数据库文件名
    pub database_file: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 编辑会话空闲多久后回收 (毫秒)
    pub session_idle_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/menu-server".into()),
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "catalog.redb".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            session_idle_timeout_ms: std::env::var("SESSION_IDLE_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30 * 60 * 1000),
        }
    }

    /// 启动前检查配置
    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(ServerError::Config("DATABASE_FILE must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ServerError::Config("REQUEST_TIMEOUT_MS must be positive".into()));
        }
        if self.session_idle_timeout_ms == 0 {
            return Err(ServerError::Config(
                "SESSION_IDLE_TIMEOUT_MS must be positive".into(),
            ));
        }
        Ok(())
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库路径 (`:memory:` 原样返回)
    pub fn database_path(&self) -> String {
        if self.database_file == crate::db::IN_MEMORY {
            return self.database_file.clone();
        }
        PathBuf::from(&self.work_dir)
            .join(&self.database_file)
            .to_string_lossy()
            .into_owned()
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
