//! Page/limit bookkeeping for list views.
//!
//! Pages are 1-based. A request past the last page is answered with an
//! empty item list and unchanged totals, never an error, so callers can
//! clamp or display "page N of M" without special cases.

/// A page request. `limit` must be at least 1; [`Pager::new`] clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u64,
    pub limit: u64,
}

impl Pager {
    pub fn new(page: u64, limit: u64) -> Pager {
        Pager {
            page: page.max(1),
            limit: limit.max(1),
        }
    }
}

impl Default for Pager {
    fn default() -> Pager {
        Pager::new(1, 10)
    }
}

/// Resolved page boundaries for a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(pager: Pager, total: u64) -> PageInfo {
        PageInfo {
            page: pager.page,
            limit: pager.limit,
            total,
            total_pages: total.div_ceil(pager.limit),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Slices a locally held list down to this page. Out-of-range pages
    /// produce an empty slice.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1).saturating_mul(self.limit) as usize;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.limit as usize).min(items.len());
        &items[start..end]
    }
}
