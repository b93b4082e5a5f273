/// Search, sort and pagination options for list endpoints
///
/// Every list endpoint accepts the same query string:
///
/// ```text
/// ?search=river&sortBy=name&sortOrder=DESC&page=2&perPage=20
/// ```
///
/// `limit` is accepted as an alias of `perPage`. `sortBy` is resolved against
/// a per-resource allow-list ([`SortSpec`]); unknown values fall back to the
/// resource default so user input never reaches the SQL text.
///
/// # Example
///
/// ```
/// use envirosite_shared::listing::{ListQuery, SortOrder, SortSpec};
///
/// const SORT: SortSpec = SortSpec {
///     allowed: &[("id", "id"), ("name", "name")],
///     default_column: "id",
///     default_order: SortOrder::Asc,
/// };
///
/// let query = ListQuery {
///     sort_by: Some("name".to_string()),
///     sort_order: Some("desc".to_string()),
///     ..Default::default()
/// };
///
/// assert_eq!(query.order_by(&SORT), ("name", SortOrder::Desc));
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

/// Default number of items per page
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Upper bound for `perPage`
pub const MAX_PER_PAGE: u32 = 100;

/// Raw list options as sent in the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Free-text search term
    pub search: Option<String>,

    /// Sort key (allow-listed per resource)
    pub sort_by: Option<String>,

    /// `ASC` or `DESC`, case-insensitive
    pub sort_order: Option<String>,

    /// 1-based page number
    pub page: Option<u32>,

    /// Page size
    #[serde(alias = "limit")]
    pub per_page: Option<u32>,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses `asc` / `desc` in any case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Allow-list of sortable columns for one resource
///
/// `allowed` maps the public `sortBy` value to the SQL column.
#[derive(Debug, Clone, Copy)]
pub struct SortSpec {
    pub allowed: &'static [(&'static str, &'static str)],
    pub default_column: &'static str,
    pub default_order: SortOrder,
}

impl SortSpec {
    /// Looks up the SQL column for a public sort key
    pub fn column(&self, key: &str) -> Option<&'static str> {
        self.allowed
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, column)| *column)
    }
}

/// Normalized pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamps raw input to sane values
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let per_page = per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    /// Builds response metadata for a result set of `total` rows
    pub fn meta(&self, total: i64) -> PageMeta {
        let total = total.max(0);
        let per_page = i64::from(self.per_page);
        PageMeta {
            total,
            page: self.page,
            per_page: self.per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned next to list data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

/// One page of results
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Transforms the items while keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    /// Resolves `sortBy` / `sortOrder` against the allow-list
    pub fn order_by(&self, spec: &SortSpec) -> (&'static str, SortOrder) {
        let column = self
            .sort_by
            .as_deref()
            .and_then(|key| spec.column(key.trim()))
            .unwrap_or(spec.default_column);
        let order = self
            .sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(spec.default_order);
        (column, order)
    }

    /// `ILIKE` pattern for the search term, or `None` when no search was given
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }

        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

/// Appends `(col1 ILIKE $n OR col2 ILIKE $n ...)` for the search pattern
///
/// The caller must already have pushed `WHERE` (or `AND`).
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], pattern: &str) {
    qb.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" ILIKE ").push_bind(pattern.to_string());
    }
    qb.push(")");
}

/// Appends `ORDER BY`, a stable `id` tie-breaker, `LIMIT` and `OFFSET`
pub fn push_order_and_page(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    order: SortOrder,
    pagination: Pagination,
) {
    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(order.as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(pagination.limit())
        .push(" OFFSET ")
        .push_bind(pagination.offset());
}

#[cfg(test)]
mod tests {
    use super::*;

    const SORT: SortSpec = SortSpec {
        allowed: &[("id", "id"), ("fullName", "full_name"), ("createdAt", "created_at")],
        default_column: "created_at",
        default_order: SortOrder::Desc,
    };

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, DEFAULT_PER_PAGE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps_input() {
        let p = Pagination::new(Some(0), Some(0));
        assert_eq!((p.page, p.per_page), (1, 1));

        let p = Pagination::new(Some(3), Some(1000));
        assert_eq!(p.per_page, MAX_PER_PAGE);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn test_page_meta_rounds_up() {
        let p = Pagination::new(Some(1), Some(10));
        assert_eq!(p.meta(0).total_pages, 0);
        assert_eq!(p.meta(10).total_pages, 1);
        assert_eq!(p.meta(11).total_pages, 2);
    }

    #[test]
    fn test_order_by_uses_allow_list() {
        let query = ListQuery {
            sort_by: Some("fullName".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order_by(&SORT), ("full_name", SortOrder::Asc));
    }

    #[test]
    fn test_order_by_falls_back_on_unknown_input() {
        let query = ListQuery {
            sort_by: Some("password_hash; DROP TABLE users".to_string()),
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        };
        assert_eq!(query.order_by(&SORT), ("created_at", SortOrder::Desc));
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let query = ListQuery {
            search: Some("  50%_off  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        let blank = ListQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.search_pattern().is_none());
    }

    #[test]
    fn test_limit_alias_deserializes() {
        let query: ListQuery = serde_json::from_str(r#"{"limit": 25, "sortBy": "id"}"#).unwrap();
        assert_eq!(query.per_page, Some(25));
        assert_eq!(query.sort_by.as_deref(), Some("id"));
    }
}
