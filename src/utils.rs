use serde::Deserialize;

// Default page size when the client doesn't send one
pub const DEFAULT_PAGE_SIZE: u64 = 20;
// Max page size to prevent excessive requests
pub const MAX_PAGE_SIZE: u64 = 100;

/// 1-based page number plus page size, as sent in the query string.
#[derive(Debug, Default, Deserialize, Clone, Copy)]
pub struct PageParams {
    // serde default gives 0 for both, which we read as "not provided".
    #[serde(default)]
    page_number: u64,
    #[serde(default)]
    page_size: u64,
}

impl PageParams {
    pub fn new(page_number: u64, page_size: u64) -> Self {
        Self { page_number, page_size }
    }

    pub fn page_number(&self) -> u64 {
        self.page_number.max(1)
    }

    pub fn page_size(&self) -> u64 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE)
        }
    }

    /// Number of records preceding the requested page.
    /// Saturates instead of overflowing on absurd page numbers.
    pub fn skip(&self) -> u64 {
        (self.page_number() - 1).saturating_mul(self.page_size())
    }

    /// Whether more records exist past this page.
    pub fn is_next(&self, total: u64, returned: usize) -> bool {
        total > self.skip().saturating_add(returned as u64)
    }
}

/// Sort direction on `created_at`.
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query string for the search endpoints (users, communities).
#[derive(Debug, Default, Deserialize, Clone)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: SortOrder,
    // Not flattened: urlencoded numbers only parse into concrete fields.
    #[serde(default)]
    pub page_number: u64,
    #[serde(default)]
    pub page_size: u64,
}

impl SearchParams {
    pub fn page(&self) -> PageParams {
        PageParams::new(self.page_number, self.page_size)
    }
}

/// True when `needle` is blank or occurs case-insensitively in any haystack.
pub fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .iter()
        .any(|h| h.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_missing() {
        let params = PageParams::default();
        assert_eq!(params.page_number(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.skip(), 0);
    }

    #[test]
    fn page_size_is_capped() {
        let params = PageParams::new(3, 10_000);
        assert_eq!(params.page_size(), MAX_PAGE_SIZE);
        assert_eq!(params.skip(), 2 * MAX_PAGE_SIZE);
    }

    #[test]
    fn is_next_on_last_page() {
        let params = PageParams::new(2, 2);
        // 5 records: page 2 holds records 3 and 4, record 5 remains
        assert!(params.is_next(5, 2));
        // 4 records: page 2 is the last one
        assert!(!params.is_next(4, 2));
        let last = PageParams::new(3, 2);
        assert!(!last.is_next(5, 1));
    }

    #[test]
    fn huge_page_number_saturates() {
        let params = PageParams::new(u64::MAX, 20);
        assert_eq!(params.skip(), u64::MAX);
        assert!(!params.is_next(5, 0));
        assert!(!params.is_next(u64::MAX, 3));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        assert!(matches_search("", &["anything"]));
        assert!(matches_search("  ", &["anything"]));
        assert!(matches_search("ALI", &["bob", "Alice Smith"]));
        assert!(!matches_search("carol", &["bob", "alice"]));
    }
}
