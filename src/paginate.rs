//! Fixed-size page slicing.
//!
//! [`page`] never clamps: an out-of-range page number yields an empty slice.
//! Guarding navigation at the first and last page is the coordinator's job
//! (see [`is_navigable`]).

use serde::Serialize;

/// Rows per page in the table and bubble views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Number of pages needed for `len` items; `0` when there are none.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice out page `page_number` (1-based).
pub fn page<T: Clone>(items: &[T], page_number: usize, page_size: usize) -> Page<T> {
    let total = total_pages(items.len(), page_size);
    let slice = match page_number.checked_sub(1) {
        Some(index) if page_size > 0 => {
            let start = index.saturating_mul(page_size).min(items.len());
            let end = start.saturating_add(page_size).min(items.len());
            items[start..end].to_vec()
        }
        _ => Vec::new(),
    };
    Page {
        items: slice,
        current_page: page_number,
        total_pages: total,
    }
}

/// Whether a navigation request to `page_number` should be honoured.
pub fn is_navigable(page_number: usize, total_pages: usize) -> bool {
    (1..=total_pages).contains(&page_number)
}
