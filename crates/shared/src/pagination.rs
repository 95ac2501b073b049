//! Offset pagination utilities.

use serde::Serialize;

/// Page used when the caller sends nothing usable.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller sends nothing usable.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 100;

/// A clamped page request.
///
/// `page` is always at least 1 and `limit` always within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
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
    /// Builds a page request from already-parsed numbers, clamping both.
    ///
    /// Zero is treated as "not supplied" and falls back to the default.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Builds a page request from raw query-string values.
    ///
    /// Each value is read by its leading integer (`"12abc"` is 12); values
    /// without one fall back to the defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(parse_leading_int).unwrap_or(DEFAULT_PAGE);
        let limit = limit.and_then(parse_leading_int).unwrap_or(DEFAULT_LIMIT);
        Self::new(page, limit)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of rows to skip before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Page metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Computes metadata for `total` matching rows under `request`.
    pub fn new(total: i64, request: &PageRequest) -> Self {
        let total = total.max(0);
        let limit = request.limit();
        let page = request.page();
        let total_pages = (total + limit - 1) / limit;

        Self {
            total,
            limit,
            page,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Parses the leading integer of `raw`, ignoring surrounding junk.
///
/// Leading whitespace and a single sign are accepted. Returns `None` when no
/// digit follows. Saturates instead of overflowing.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    if !seen_digit {
        return None;
    }

    Some(if negative { -value } else { value })
}
