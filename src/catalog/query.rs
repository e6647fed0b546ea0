//! Catalog query coercion and SQL assembly
//!
//! Raw query-string values are coerced into a typed `CatalogQuery` once, at
//! the boundary. SQL text is assembled only from fixed fragments; every
//! caller-supplied value goes through `push_bind`.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use std::str::FromStr;

use crate::domain::GameSummary;

/// Discount price when present and lower than the list price, else the list price.
/// Expects the games table aliased as `g`.
macro_rules! effective_price {
    () => {
        "CASE WHEN g.discount_price IS NOT NULL AND g.discount_price < g.price \
         THEN g.discount_price ELSE g.price END"
    };
}
pub(crate) use effective_price;

/// Column list for `GameSummary`; needs `games g` and `categories c` in scope
macro_rules! game_columns {
    () => {
        concat!(
            "g.id, g.title, g.description, g.price, g.discount_price, ",
            $crate::catalog::query::effective_price!(),
            " AS effective_price, g.category_id, c.name AS category_name, \
             g.developer, g.publisher, g.release_date, g.image, g.banner_image, \
             g.is_featured, g.rating, g.created_at"
        )
    };
}
pub(crate) use game_columns;

macro_rules! game_summary_select {
    () => {
        concat!(
            "SELECT ",
            $crate::catalog::query::game_columns!(),
            " FROM games g LEFT JOIN categories c ON c.id = g.category_id"
        )
    };
}
pub(crate) use game_summary_select;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 50;

// =========================================================================
// Raw parameters
// =========================================================================

/// Untyped catalog parameters exactly as they arrive in the query string
#[derive(Debug, Clone, Default)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub discount: Option<String>,
    pub featured: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl CatalogParams {
    /// Collect decoded query-string pairs. Unknown keys are ignored and the
    /// first occurrence of a repeated key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "search" => &mut params.search,
                "category" => &mut params.category,
                "min_price" => &mut params.min_price,
                "max_price" => &mut params.max_price,
                "discount" => &mut params.discount,
                "featured" => &mut params.featured,
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}

// =========================================================================
// Typed query
// =========================================================================

/// Allow-listed sort columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Price,
    ReleaseDate,
    #[default]
    CreatedAt,
    Rating,
}

impl SortKey {
    /// Unknown keys fall back to `CreatedAt`
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "title" => SortKey::Title,
            "price" => SortKey::Price,
            "release_date" => SortKey::ReleaseDate,
            "rating" => SortKey::Rating,
            _ => SortKey::CreatedAt,
        }
    }

    /// Fixed column expression for ORDER BY
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Title => "g.title",
            SortKey::Price => effective_price!(),
            SortKey::ReleaseDate => "g.release_date",
            SortKey::CreatedAt => "g.created_at",
            SortKey::Rating => "g.rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated catalog request
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub discounted_only: bool,
    pub featured_only: bool,
    pub sort: SortKey,
    pub direction: SortDirection,
    pub page: u32,
    pub limit: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            discounted_only: false,
            featured_only: false,
            sort: SortKey::default(),
            direction: SortDirection::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&CatalogParams> for CatalogQuery {
    /// Coercion never fails: anything unusable becomes "no filter" or the default.
    fn from(params: &CatalogParams) -> Self {
        let search = params.search.as_deref().and_then(search_term);

        let category_id = params
            .category
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        let page = params
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let limit = params
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|l| l.clamp(1, MAX_PAGE_SIZE as i64) as u32)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            search,
            category_id,
            min_price: params.min_price.as_deref().and_then(parse_price),
            max_price: params.max_price.as_deref().and_then(parse_price),
            discounted_only: params.discount.as_deref().map(is_flag_set).unwrap_or(false),
            featured_only: params.featured.as_deref().map(is_flag_set).unwrap_or(false),
            sort: params.sort.as_deref().map(SortKey::parse).unwrap_or_default(),
            direction: params
                .order
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or_default(),
            page,
            limit,
        }
    }
}

impl CatalogQuery {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Search text Postgres will accept: NUL bytes dropped and whitespace
/// trimmed. Nothing left means no search.
pub fn search_term(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '\0').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn parse_price(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

fn is_flag_set(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true")
}

/// `%term%` with LIKE metacharacters escaped so the term matches literally
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// =========================================================================
// Result page
// =========================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl Pagination {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        let pages = (total.max(0) + limit_i64 - 1) / limit_i64;
        Self {
            total,
            page,
            limit,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub games: Vec<GameSummary>,
    pub pagination: Pagination,
}

// =========================================================================
// SQL assembly
// =========================================================================

/// Append the WHERE clause shared by the page and count queries
fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, query: &CatalogQuery) {
    builder.push(" WHERE TRUE");

    if let Some(term) = &query.search {
        let pattern = like_pattern(term);
        builder.push(" AND (g.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR g.description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR g.developer ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(category_id) = query.category_id {
        builder.push(" AND g.category_id = ");
        builder.push_bind(category_id);
    }

    if let Some(min_price) = query.min_price {
        builder.push(concat!(" AND ", effective_price!(), " >= "));
        builder.push_bind(min_price);
    }

    if let Some(max_price) = query.max_price {
        builder.push(concat!(" AND ", effective_price!(), " <= "));
        builder.push_bind(max_price);
    }

    if query.discounted_only {
        builder.push(" AND g.discount_price IS NOT NULL");
    }

    if query.featured_only {
        builder.push(" AND g.is_featured");
    }
}

/// One page of games, ties broken by id
pub fn page_query(query: &CatalogQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(game_summary_select!());
    push_filters(&mut builder, query);

    builder.push(" ORDER BY ");
    builder.push(query.sort.column());
    builder.push(" ");
    builder.push(query.direction.keyword());
    builder.push(", g.id ASC LIMIT ");
    builder.push_bind(i64::from(query.limit));
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());

    builder
}

/// Total matching rows, independent of LIMIT/OFFSET
pub fn count_query(query: &CatalogQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT COUNT(*) FROM games g LEFT JOIN categories c ON c.id = g.category_id",
    );
    push_filters(&mut builder, query);
    builder
}
