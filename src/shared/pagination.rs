/// Pagination query parameters
#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u32,
    pub limit: u32,
}

impl PaginationParams {
    /// Clamp caller input: page starts at 1, limit within 1..=100.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(20).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) * self.limit) as usize
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    /// Wrap one page fetched by the store along with the total match count.
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total.div_ceil(params.limit as u64) as u32,
        }
    }

    /// Slice an already-ordered collection into one page.
    pub fn from_vec(all: Vec<T>, params: PaginationParams) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.limit as usize)
            .collect();
        Self::new(items, total, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let p = PaginationParams::new(Some(0), Some(500));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn store_page_keeps_total() {
        let page = PaginatedResult::new(vec![1, 2], 41, PaginationParams::new(Some(3), Some(20)));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn slices_second_page() {
        let page = PaginatedResult::from_vec((1..=25).collect::<Vec<_>>(), PaginationParams::new(Some(2), Some(10)));
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
    }
}
