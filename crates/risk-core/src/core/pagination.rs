/// One page of an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Requested page after clamping to `[1, total_pages]`.
    pub page: usize,
    pub page_size: usize,
    /// Never less than 1, even for an empty collection.
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` into 1-based pages of `page_size`.
///
/// Pages past the end yield an empty slice rather than an error. A zero
/// page size is treated as 1.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let requested = page.max(1);
    let slice = if requested > total_pages {
        &items[..0]
    } else {
        let start = (requested - 1) * page_size;
        let end = (start + page_size).min(total_items);
        &items[start..end]
    };

    Page {
        items: slice,
        page: requested.min(total_pages),
        page_size,
        total_pages,
        total_items,
    }
}
