//! Draft/live catalog reconciliation
//!
//! # 模块结构
//!
//! ```text
//! catalog/
//! ├── snapshot.rs    # 归一化快照、字段差异
//! ├── view.rs        # 草稿视图、未发布变更检测
//! ├── tracker.rs     # 待删除集合、draft→live 映射
//! ├── publish.rs     # 发布流程、单飞锁
//! ├── session.rs     # 编辑会话与注册表
//! └── visibility.rs  # 顾客可见菜单
//! ```

pub mod error;
pub mod publish;
pub mod session;
pub mod snapshot;
pub mod tracker;
pub mod view;
pub mod visibility;

pub use error::{CatalogError, CatalogResult};
pub use publish::{PublishCoordinator, PublishGuard, PublishOutcome};
pub use session::{EditSession, SessionRegistry, publish_to_completion};
pub use snapshot::{FieldChange, ItemSnapshot, diff_items};
pub use tracker::ChangeTracker;
pub use view::{
    CatalogRows, ChangeKind, ItemChange, compute_draft_view, compute_has_unpublished_changes,
    draft_catalog, summarize_changes,
};
pub use visibility::{customer_catalog, visible_items};
