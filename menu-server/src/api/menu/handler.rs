//! Menu API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{
    CatalogItem, CatalogItemCreate, CatalogItemUpdate, DraftStatus, DraftViewItem, PublishReport,
    PublishSummary,
};

use crate::catalog::{self, ItemChange};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Serialize)]
pub struct SessionOpened {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeletionMarked {
    /// Row id carrying the deletion (a draft copy for live-only items)
    pub pending_id: String,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    #[serde(flatten)]
    pub report: PublishReport,
    pub summary: PublishSummary,
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub user_id: Option<String>,
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /api/menu/sessions - 打开编辑会话
pub async fn open_session(State(state): State<ServerState>) -> AppResult<ApiResponse<SessionOpened>> {
    let session_id = state.sessions.open().await?;
    Ok(ok(SessionOpened { session_id }))
}

/// DELETE /api/menu/sessions/:sid - 关闭编辑会话
pub async fn close_session(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.sessions.close(&sid)?;
    Ok(ApiResponse::ok())
}

// =============================================================================
// Reads
// =============================================================================

/// GET /api/menu/sessions/:sid/draft - 草稿视图 (每次读取都从存储刷新)
pub async fn draft_view(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
) -> AppResult<ApiResponse<Vec<DraftViewItem>>> {
    let session = state.sessions.get(&sid)?;
    let mut session = session.lock().await;
    session.refresh().await?;
    Ok(ok(session.draft_view()))
}

/// GET /api/menu/sessions/:sid/status - 未发布变更状态
pub async fn status(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
) -> AppResult<ApiResponse<DraftStatus>> {
    let session = state.sessions.get(&sid)?;
    let mut session = session.lock().await;
    session.refresh().await?;
    Ok(ok(session.status()))
}

/// GET /api/menu/sessions/:sid/changes - 变更明细
pub async fn changes(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
) -> AppResult<ApiResponse<Vec<ItemChange>>> {
    let session = state.sessions.get(&sid)?;
    let mut session = session.lock().await;
    session.refresh().await?;
    Ok(ok(session.changes()))
}

// =============================================================================
// Mutations
// =============================================================================

/// POST /api/menu/sessions/:sid/items - 新建草稿商品
pub async fn stage_new(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
    Json(payload): Json<CatalogItemCreate>,
) -> AppResult<ApiResponse<CatalogItem>> {
    let session = state.sessions.get(&sid)?;
    let item = session.lock().await.stage_new(payload).await?;
    Ok(ok(item))
}

/// PUT /api/menu/sessions/:sid/items/:id - 编辑商品 (live 商品自动复制为草稿)
pub async fn stage_edit(
    State(state): State<ServerState>,
    Path((sid, id)): Path<(String, String)>,
    Json(payload): Json<CatalogItemUpdate>,
) -> AppResult<ApiResponse<CatalogItem>> {
    let session = state.sessions.get(&sid)?;
    let item = session.lock().await.stage_edit(&id, payload).await?;
    Ok(ok(item))
}

/// POST /api/menu/sessions/:sid/items/:id/stock - 切换库存状态
pub async fn toggle_stock(
    State(state): State<ServerState>,
    Path((sid, id)): Path<(String, String)>,
) -> AppResult<ApiResponse<CatalogItem>> {
    let session = state.sessions.get(&sid)?;
    let item = session.lock().await.toggle_stock(&id).await?;
    Ok(ok(item))
}

/// POST /api/menu/sessions/:sid/items/:id/deletion - 标记删除
pub async fn mark_for_deletion(
    State(state): State<ServerState>,
    Path((sid, id)): Path<(String, String)>,
) -> AppResult<ApiResponse<DeletionMarked>> {
    let session = state.sessions.get(&sid)?;
    let pending_id = session.lock().await.mark_for_deletion(&id).await?;
    Ok(ok(DeletionMarked { pending_id }))
}

/// DELETE /api/menu/sessions/:sid/items/:id/deletion - 取消删除
pub async fn cancel_deletion(
    State(state): State<ServerState>,
    Path((sid, id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    let session = state.sessions.get(&sid)?;
    session.lock().await.cancel_deletion(&id).await?;
    Ok(ApiResponse::ok())
}

/// POST /api/menu/sessions/:sid/publish - 发布
///
/// 发布锁在会话锁之前获取：第二个发布请求直接返回 409，而不是排队等待。
/// 发布在独立任务中运行，请求超时或客户端断开不会中断发布流程。
pub async fn publish(
    State(state): State<ServerState>,
    Path(sid): Path<String>,
) -> AppResult<ApiResponse<PublishResponse>> {
    let session = state.sessions.get(&sid)?;
    let guard = state.publisher.try_begin()?;

    let report = catalog::publish_to_completion(session, guard).await?;

    let summary = report.summary();
    let message = if report.is_clean() {
        "Published".to_string()
    } else {
        format!("Published with {} failures", summary.failed)
    };
    Ok(ok_with_message(PublishResponse { report, summary }, message))
}

// =============================================================================
// Customer catalog
// =============================================================================

/// GET /api/menu/live?user_id= - 顾客可见菜单
pub async fn live_catalog(
    State(state): State<ServerState>,
    Query(query): Query<LiveQuery>,
) -> AppResult<ApiResponse<Vec<CatalogItem>>> {
    let items = catalog::customer_catalog(
        state.store.as_ref(),
        state.assignments.as_ref(),
        query.user_id.as_deref(),
    )
    .await?;
    Ok(ok(items))
}
