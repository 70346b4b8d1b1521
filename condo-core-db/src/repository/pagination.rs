/// Offset-based page request, used by ledger and statement queries
///
/// # Example
/// ```
/// use condo_core_db::repository::pagination::PageRequest;
///
/// let first = PageRequest::new(50, 0);
/// let third = PageRequest::for_page(50, 3);
/// assert_eq!(third.offset, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// 1-based page numbers; page 0 is treated as page 1.
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        Self {
            limit: page_size,
            offset: (page_number.max(1) - 1) * page_size,
        }
    }

    pub fn page_number(&self) -> usize {
        page_number(self.limit, self.offset)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(50, 0)
    }
}

/// One page of results plus the total row count across all pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    pub fn page_number(&self) -> usize {
        page_number(self.limit, self.offset)
    }

    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    pub fn is_last_page(&self) -> bool {
        !self.has_more()
    }
}

fn page_number(limit: usize, offset: usize) -> usize {
    if limit == 0 {
        1
    } else {
        offset / limit + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_pages() {
        let request = PageRequest::for_page(25, 3);
        assert_eq!(request.offset, 50);
        assert_eq!(request.page_number(), 3);
        assert_eq!(PageRequest::for_page(25, 0).offset, 0);

        let page = Page::new(vec![(); 10], 60, 25, 50);
        assert!(page.is_last_page());
        assert_eq!(page.total_pages(), 3);
        assert!(!page.is_first_page());
    }
}
