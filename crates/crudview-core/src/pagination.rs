// Page-link window for list views.

use serde::Serialize;

/// Pagination descriptor and its derived page links.
///
/// Links run from `max(1, current - ceil(window / 2))` to
/// `min(total_pages, min + window)`, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListNavigator {
    pub current_page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub scroll_window: u32,
    links: Vec<u64>,
}

impl Default for ListNavigator {
    fn default() -> Self {
        Self::new(1, 10, 0, 10)
    }
}

impl ListNavigator {
    /// Zero page sizes and windows are raised to 1; page 0 is treated as page 1.
    pub fn new(current_page: u32, page_size: u32, total_records: u64, scroll_window: u32) -> Self {
        let mut nav = Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            total_records,
            scroll_window: scroll_window.max(1),
            links: Vec::new(),
        };
        nav.links = nav.compose_links();
        nav
    }

    pub fn total_pages(&self) -> u64 {
        self.total_records.div_ceil(u64::from(self.page_size))
    }

    /// Page numbers to render, in ascending order.
    pub fn links(&self) -> &[u64] {
        &self.links
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.total_pages()
    }

    fn compose_links(&self) -> Vec<u64> {
        let total_pages = self.total_pages();
        let offset = u64::from(self.scroll_window.div_ceil(2));
        let min = u64::from(self.current_page).saturating_sub(offset).max(1);
        let max = (min + u64::from(self.scroll_window)).min(total_pages);
        (min..=max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn window_is_capped_by_total_pages() {
        let nav = ListNavigator::new(3, 10, 47, 5);
        assert_eq!(nav.total_pages(), 5);
        assert_eq!(nav.links(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn window_slides_with_current_page() {
        let nav = ListNavigator::new(10, 10, 200, 4);
        assert_eq!(nav.total_pages(), 20);
        assert_eq!(nav.links(), &[8, 9, 10, 11, 12]);
    }

    #[test]
    fn empty_result_has_no_links() {
        let nav = ListNavigator::new(1, 10, 0, 5);
        assert_eq!(nav.total_pages(), 0);
        assert!(nav.links().is_empty());
        assert!(!nav.has_next());
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let nav = ListNavigator::new(0, 0, 3, 0);
        assert_eq!(nav.page_size, 1);
        assert_eq!(nav.current_page, 1);
        assert_eq!(nav.total_pages(), 3);
    }

    #[test]
    fn previous_and_next() {
        let nav = ListNavigator::new(2, 10, 25, 5);
        assert!(nav.has_previous());
        assert!(nav.has_next());
    }
}
