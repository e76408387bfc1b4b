//! GhostLayer Core Types
//!
//! This crate provides the records shared by every GhostLayer crate:
//! - The closed `Category` enumeration and its metadata table
//! - Match, user rule, custom pattern and whitelist records
//! - Core error types

pub mod category;
pub mod error;
pub mod types;

pub use category::{Category, CategoryMeta};
pub use error::{Error, Result, UnsafeReason};
pub use types::{CustomPattern, EntityKey, Match, ToggleOverride, UserRule, WhitelistEntry};
