use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::response::Meta;

/// Products shown per catalog page.
pub const CATALOG_PAGE_SIZE: u64 = 4;

/// `?page=` as typed by a visitor; anything that is not an integer means page 1.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn requested(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// A resolved page within a listing of `total` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl PageWindow {
    /// Resolve `requested` against the listing size. Pages outside
    /// `1..=pages` land on the last page; an empty listing still has page 1.
    pub fn resolve(requested: i64, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total.div_ceil(per_page).max(1);
        let page = u64::try_from(requested)
            .ok()
            .filter(|p| (1..=pages).contains(p))
            .unwrap_or(pages);

        Self {
            page,
            per_page,
            total,
            pages,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    pub fn meta(&self) -> Meta {
        Meta::new(
            self.page as i64,
            self.per_page as i64,
            self.total as i64,
            self.pages as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn non_integer_pages_default_to_first() {
        assert_eq!(query(None).requested(), 1);
        assert_eq!(query(Some("abc")).requested(), 1);
        assert_eq!(query(Some("2.5")).requested(), 1);
        assert_eq!(query(Some(" 3 ")).requested(), 3);
    }

    #[test]
    fn in_range_page_is_kept() {
        let window = PageWindow::resolve(2, 4, 10);
        assert_eq!(window.page, 2);
        assert_eq!(window.pages, 3);
        assert_eq!(window.offset(), 4);
    }

    #[test]
    fn out_of_range_pages_clamp_to_last() {
        assert_eq!(PageWindow::resolve(99, 4, 10).page, 3);
        assert_eq!(PageWindow::resolve(0, 4, 10).page, 3);
        assert_eq!(PageWindow::resolve(-1, 4, 10).page, 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let window = PageWindow::resolve(5, 4, 0);
        assert_eq!(window.page, 1);
        assert_eq!(window.pages, 1);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn meta_reflects_window() {
        let meta = PageWindow::resolve(1, 4, 9).meta();
        assert_eq!(meta, Meta::new(1, 4, 9, 3));
    }
}
