//! Data models
//!
//! Shared between menu-server and the admin/ordering frontends (via API).
//! Row ids are opaque strings assigned by the catalog store.

pub mod assignment;
pub mod catalog_item;
pub mod publish;
pub mod serde_helpers;

// Re-exports
pub use assignment::*;
pub use catalog_item::*;
pub use publish::*;
