//! Catalog Query Engine
//!
//! Typed catalog requests, safe SQL assembly and the catalog read side.

pub mod query;
mod repository;

pub use query::{
    like_pattern, search_term, CatalogPage, CatalogParams, CatalogQuery, Pagination, SortDirection,
    SortKey,
};
pub use repository::CatalogRepository;
