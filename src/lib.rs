//! game_store Library
//!
//! Storefront core: catalog queries, cart, checkout, wishlist and reviews.
//! Re-exports modules for the server binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;

mod error;

pub use config::Config;
pub use domain::{DomainError, Money, MoneyError, OperationContext, Pricing};
pub use error::{AppError, AppResult};
