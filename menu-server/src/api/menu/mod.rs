//! Menu API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/menu/sessions | POST | 打开编辑会话 |
//! | /api/menu/sessions/{sid} | DELETE | 关闭编辑会话 |
//! | /api/menu/sessions/{sid}/draft | GET | 草稿视图 |
//! | /api/menu/sessions/{sid}/status | GET | 未发布变更状态 |
//! | /api/menu/sessions/{sid}/changes | GET | 变更明细 |
//! | /api/menu/sessions/{sid}/items | POST | 新建草稿商品 |
//! | /api/menu/sessions/{sid}/items/{id} | PUT | 编辑商品 |
//! | /api/menu/sessions/{sid}/items/{id}/stock | POST | 切换库存状态 |
//! | /api/menu/sessions/{sid}/items/{id}/deletion | POST / DELETE | 标记 / 取消删除 |
//! | /api/menu/sessions/{sid}/publish | POST | 发布 |
//! | /api/menu/live | GET | 顾客可见菜单 (`?user_id=`) |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/menu", menu_routes())
}

fn menu_routes() -> Router<ServerState> {
    Router::new()
        .route("/live", get(handler::live_catalog))
        .route("/sessions", post(handler::open_session))
        .route("/sessions/{sid}", delete(handler::close_session))
        .route("/sessions/{sid}/draft", get(handler::draft_view))
        .route("/sessions/{sid}/status", get(handler::status))
        .route("/sessions/{sid}/changes", get(handler::changes))
        .route("/sessions/{sid}/items", post(handler::stage_new))
        .route("/sessions/{sid}/items/{id}", put(handler::stage_edit))
        .route("/sessions/{sid}/items/{id}/stock", post(handler::toggle_stock))
        .route(
            "/sessions/{sid}/items/{id}/deletion",
            post(handler::mark_for_deletion).delete(handler::cancel_deletion),
        )
        .route("/sessions/{sid}/publish", post(handler::publish))
}
