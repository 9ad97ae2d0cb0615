//! Pagination shared by every list operation.
//!
//! Raw `page`/`limit` query values never cause an error: anything missing,
//! non-numeric or below one falls back to the defaults. Oversized values are
//! clamped so that `limit` and `offset` always fit a signed 64-bit SQL integer.

use serde::Serialize;

/// Page used when the caller gives none or an unusable one.
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when the caller gives none or an unusable one.
pub const DEFAULT_LIMIT: u64 = 10;
/// Largest page size a caller can ask for.
pub const MAX_LIMIT: u64 = 100;

// Storage binds LIMIT/OFFSET as i64.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// A normalized pagination request (1-based page)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request from numeric values, replacing zeros with defaults.
    ///
    /// `limit` is capped at [`MAX_LIMIT`] and `page` at the last page whose
    /// offset is still representable, so any input yields a valid query.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        let limit = match limit {
            0 => DEFAULT_LIMIT,
            l if l > MAX_LIMIT => MAX_LIMIT,
            l => l,
        };
        let last_page = MAX_OFFSET / limit + 1;
        let page = match page {
            0 => DEFAULT_PAGE,
            p if p > last_page => last_page,
            p => p,
        };
        Self { page, limit }
    }

    /// Builds a request from raw query-string values.
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(parse_positive(page), parse_positive(limit))
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether items remain beyond this page, given the total count.
    #[must_use]
    pub const fn has_next(&self, total: u64) -> bool {
        total > self.page.saturating_mul(self.limit)
    }
}

// 0 is the "use the default" sentinel understood by `PageRequest::new`.
fn parse_positive(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

/// One page of results with derived navigation flags
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageResult<T> {
    /// Items on this page, newest first
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    /// Items per page
    pub limit: u64,
    /// Total matching items across all pages
    pub total: u64,
    /// `page > 1`
    pub has_previous: bool,
    /// `total > page * limit`
    pub has_next: bool,
}

impl<T> PageResult<T> {
    /// Assembles a page, deriving the navigation flags from the request.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            limit: request.limit(),
            total,
            has_previous: request.has_previous(),
            has_next: request.has_next(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_flags() {
        let req = PageRequest::new(3, 10);
        assert_eq!(req.offset(), 20);
        assert!(req.has_previous());
        assert!(req.has_next(31));
        assert!(!req.has_next(30));

        let first = PageRequest::new(1, 5);
        assert_eq!(first.offset(), 0);
        assert!(!first.has_previous());
        assert!(!first.has_next(0));
        assert!(first.has_next(6));
    }

    #[test]
    fn test_flags_match_formula_over_a_grid() {
        for page in 1..=6_u64 {
            for limit in 1..=6_u64 {
                for total in 0..=40_u64 {
                    let req = PageRequest::new(page, limit);
                    assert_eq!(req.has_next(total), total > page * limit);
                    assert_eq!(req.has_previous(), page > 1);
                }
            }
        }
    }

    #[test]
    fn test_malformed_input_falls_back_to_defaults() {
        let expected = PageRequest::new(1, 10);
        assert_eq!(PageRequest::from_query(None, None), expected);
        assert_eq!(PageRequest::from_query(Some("abc"), Some("ten")), expected);
        assert_eq!(PageRequest::from_query(Some("-2"), Some("")), expected);
        assert_eq!(PageRequest::from_query(Some("0"), Some("0")), expected);
        assert_eq!(PageRequest::default(), expected);
    }

    #[test]
    fn test_valid_query_values_are_used() {
        let req = PageRequest::from_query(Some(" 4 "), Some("25"));
        assert_eq!(req.page(), 4);
        assert_eq!(req.limit(), 25);
        assert_eq!(req.offset(), 75);
    }

    #[test]
    fn test_oversized_values_are_clamped() {
        let huge_limit = PageRequest::from_query(Some("1"), Some("18446744073709551615"));
        assert_eq!(huge_limit.limit(), MAX_LIMIT);
        assert_eq!(huge_limit.offset(), 0);

        let huge_page = PageRequest::from_query(Some("9223372036854775807"), Some("10"));
        assert_eq!(huge_page.limit(), 10);
        assert!(i64::try_from(huge_page.offset()).is_ok());
        assert!(huge_page.has_previous());
        assert!(!huge_page.has_next(1_000));

        let max = PageRequest::new(u64::MAX, u64::MAX);
        assert!(i64::try_from(max.offset()).is_ok());
        assert!(i64::try_from(max.limit()).is_ok());
    }

    #[test]
    fn test_page_result_derives_flags() {
        let result = PageResult::new(vec![3, 2], PageRequest::new(2, 2), 5);
        assert!(result.has_previous);
        assert!(result.has_next);
        assert_eq!(result.items, vec![3, 2]);
        assert_eq!(result.total, 5);
    }
}
