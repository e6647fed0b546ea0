//! Command Handlers module
//!
//! Handlers that orchestrate storefront operations. Each handler owns a pool
//! handle, takes the caller's `OperationContext` and enforces the cart,
//! ownership and rating invariants against the store.

mod catalog_admin_handler;
mod cart_handler;
mod checkout_handler;
mod commands;
mod library_handler;
pub mod ownership;
mod review_handler;
mod wishlist_handler;


pub use catalog_admin_handler::CatalogAdminHandler;
pub use cart_handler::CartHandler;
pub use checkout_handler::CheckoutHandler;
pub use commands::*;
pub use library_handler::LibraryHandler;
pub use review_handler::ReviewHandler;
pub use wishlist_handler::WishlistHandler;
