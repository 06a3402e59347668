use serde::Serialize;

/// Default page size when the caller passes `0`.
pub const DEFAULT_PER_PAGE: u32 = 15;
/// Upper bound for a single page.
pub const MAX_PER_PAGE: u32 = 100;

/// One page of results plus the metadata listing screens need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, total: u64, per_page: u32, current_page: u32) -> Self {
        let last_page = total.div_ceil(u64::from(per_page)).max(1);
        Self {
            items,
            total,
            per_page,
            current_page,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            last_page: self.last_page,
        }
    }
}

/// Normalizes `(per_page, page)`: `0` per page means the default, sizes clamp
/// to `MAX_PER_PAGE`, and page numbers start at 1.
pub fn normalize_page(per_page: u32, page: u32) -> (u32, u32) {
    let per_page = match per_page {
        0 => DEFAULT_PER_PAGE,
        value => value.min(MAX_PER_PAGE),
    };
    (per_page, page.max(1))
}

#[cfg(test)]
mod tests {
    use super::{normalize_page, Page, DEFAULT_PER_PAGE, MAX_PER_PAGE};

    #[test]
    fn normalize_page_applies_defaults_and_clamps() {
        assert_eq!(normalize_page(0, 0), (DEFAULT_PER_PAGE, 1));
        assert_eq!(normalize_page(500, 3), (MAX_PER_PAGE, 3));
        assert_eq!(normalize_page(7, 2), (7, 2));
    }

    #[test]
    fn last_page_is_at_least_one() {
        let empty: Page<()> = Page::new(Vec::new(), 0, 10, 1);
        assert_eq!(empty.last_page, 1);
        assert!(!empty.has_more_pages());

        let page: Page<()> = Page::new(Vec::new(), 21, 10, 1);
        assert_eq!(page.last_page, 3);
        assert!(page.has_more_pages());
    }
}
