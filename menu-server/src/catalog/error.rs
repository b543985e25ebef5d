//! Catalog engine errors

use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog item not found: {0}")]
    NotFound(String),

    #[error("Edit session not found: {0}")]
    SessionNotFound(String),

    #[error("Item is not pending deletion: {0}")]
    DeletionNotPending(String),

    #[error("Invalid item name: {0}")]
    InvalidName(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid abv: {0}")]
    InvalidAbv(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("A publish is already in progress")]
    PublishInProgress,

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidName(_)
                | CatalogError::InvalidPrice(_)
                | CatalogError::InvalidAbv(_)
                | CatalogError::Validation(_)
        )
    }

    /// Store not-found errors surface as item not-found for `id`
    pub(crate) fn from_store(err: RepoError, id: &str) -> Self {
        match err {
            RepoError::NotFound(_) => CatalogError::NotFound(id.to_string()),
            other => CatalogError::Store(other),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => AppError::item_not_found(id),
            CatalogError::SessionNotFound(sid) => {
                AppError::with_message(ErrorCode::SessionNotFound, format!("Session {sid} not found"))
                    .with_detail("session_id", sid)
            }
            CatalogError::DeletionNotPending(id) => AppError::with_message(
                ErrorCode::DeletionNotPending,
                format!("Item {id} is not pending deletion"),
            )
            .with_detail("item_id", id),
            CatalogError::InvalidName(msg) => AppError::with_message(ErrorCode::InvalidItemName, msg),
            CatalogError::InvalidPrice(msg) => AppError::with_message(ErrorCode::InvalidPrice, msg),
            CatalogError::InvalidAbv(msg) => AppError::with_message(ErrorCode::InvalidAbv, msg),
            CatalogError::Validation(msg) => AppError::validation(msg),
            CatalogError::PublishInProgress => AppError::new(ErrorCode::PublishInProgress),
            CatalogError::Store(e) => match e {
                RepoError::NotFound(msg) => AppError::not_found(msg),
                RepoError::Validation(msg) => AppError::validation(msg),
                RepoError::Unavailable(msg) => {
                    AppError::with_message(ErrorCode::StoreUnavailable, msg)
                }
                RepoError::Database(msg) => AppError::database(msg),
                RepoError::Serialization(e) => AppError::internal(e.to_string()),
            },
            CatalogError::Internal(msg) => AppError::internal(msg),
        }
    }
}
