//! Unified error codes for the menu service
//!
//! This module defines all error codes used across menu-server and the admin frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Edit session errors
//! - 6xxx: Catalog item errors
//! - 7xxx: Publish errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,

    // ==================== 1xxx: Edit session ====================
    /// Edit session does not exist (closed or never opened)
    SessionNotFound = 1001,

    // ==================== 6xxx: Catalog ====================
    /// Catalog item not found in either partition
    CatalogItemNotFound = 6001,
    /// Item name is empty or too long
    InvalidItemName = 6002,
    /// Price must be greater than zero
    InvalidPrice = 6003,
    /// Alcohol by volume outside 0-100
    InvalidAbv = 6004,
    /// Item has no pending deletion to cancel
    DeletionNotPending = 6005,

    // ==================== 7xxx: Publish ====================
    /// Another publish is still running
    PublishInProgress = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Storage temporarily unavailable
    StoreUnavailable = 9004,
}

impl ErrorCode {
    /// Get the numeric value of this error code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Success",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",

            // Session
            ErrorCode::SessionNotFound => "Edit session not found",

            // Catalog
            ErrorCode::CatalogItemNotFound => "Catalog item not found",
            ErrorCode::InvalidItemName => "Invalid item name",
            ErrorCode::InvalidPrice => "Price must be greater than zero",
            ErrorCode::InvalidAbv => "Alcohol by volume must be between 0 and 100",
            ErrorCode::DeletionNotPending => "Item is not pending deletion",

            // Publish
            ErrorCode::PublishInProgress => "A publish is already in progress",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StoreUnavailable => "Storage temporarily unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),

            // Session
            1001 => Ok(ErrorCode::SessionNotFound),

            // Catalog
            6001 => Ok(ErrorCode::CatalogItemNotFound),
            6002 => Ok(ErrorCode::InvalidItemName),
            6003 => Ok(ErrorCode::InvalidPrice),
            6004 => Ok(ErrorCode::InvalidAbv),
            6005 => Ok(ErrorCode::DeletionNotPending),

            // Publish
            7001 => Ok(ErrorCode::PublishInProgress),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::StoreUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::SessionNotFound.code(), 1001);
        assert_eq!(ErrorCode::CatalogItemNotFound.code(), 6001);
        assert_eq!(ErrorCode::PublishInProgress.code(), 7001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(6003), Ok(ErrorCode::InvalidPrice));
        assert_eq!(ErrorCode::try_from(7001), Ok(ErrorCode::PublishInProgress));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(6), Err(InvalidErrorCode(6)));
        assert_eq!(ErrorCode::try_from(9003), Err(InvalidErrorCode(9003)));
        assert_eq!(ErrorCode::try_from(4001), Err(InvalidErrorCode(4001)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidAbv).unwrap();
        assert_eq!(json, "6004");

        let code: ErrorCode = serde_json::from_str("9004").unwrap();
        assert_eq!(code, ErrorCode::StoreUnavailable);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("12345");
        assert!(result.is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(
            ErrorCode::PublishInProgress.message(),
            "A publish is already in progress"
        );
    }
}
