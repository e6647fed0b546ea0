//! Domain module
//!
//! Core domain types and business rules.

pub mod context;
pub mod error;
pub mod models;
pub mod money;

pub use context::{Identity, OperationContext, Role};
pub use error::DomainError;
pub use models::{
    CartLine, CategoryWithCount, GameDetail, GameImage, GameSummary, LibraryEntry,
    ProfileStats, ReviewView, SearchHit, ViewerState, WishlistLine,
};
pub use money::{Money, MoneyError, Pricing};
