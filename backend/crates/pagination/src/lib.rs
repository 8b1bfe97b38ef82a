//! Offset pagination primitives shared by staffdesk list actions.
//!
//! A [`PageRequest`] describes which slice of a result set the caller wants,
//! and [`paginate_result`] wraps the fetched rows together with the
//! [`PaginationMeta`] a dashboard table needs to render page controls.
//!
//! ## Invariants
//! - `total_pages == ceil(total_items / page_size)`, or `0` when there are no
//!   items.
//! - `has_next_page == (page < total_pages)`.
//! - `has_previous_page == (page > 1)`.

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors raised when a page request is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// Pages are numbered from one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one row.
    #[error("page size must be at least 1")]
    ZeroPageSize,
    /// The requested page size exceeds [`MAX_PAGE_SIZE`].
    #[error("page size must be at most {max}")]
    PageSizeTooLarge {
        /// Maximum accepted page size.
        max: u32,
    },
}

/// Validated one-based page request.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(3, 20).expect("valid page");
/// assert_eq!(request.offset(), 40);
/// assert_eq!(request.limit(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `page` or `page_size` is zero, or when
    /// `page_size` exceeds [`MAX_PAGE_SIZE`].
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if page_size == 0 {
            return Err(PageRequestError::ZeroPageSize);
        }
        if page_size > MAX_PAGE_SIZE {
            return Err(PageRequestError::PageSizeTooLarge { max: MAX_PAGE_SIZE });
        }
        Ok(Self { page, page_size })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows skipped before this page starts.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    /// Maximum number of rows on this page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Page metadata returned alongside list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// One-based page number.
    pub page: u32,
    /// Number of rows per page.
    pub page_size: u32,
    /// Number of rows matching the query across all pages.
    pub total_items: u64,
    /// Number of pages needed to show every matching row.
    pub total_pages: u64,
    /// Whether a page exists after this one.
    pub has_next_page: bool,
    /// Whether a page exists before this one.
    pub has_previous_page: bool,
}

impl PaginationMeta {
    /// Compute page metadata from the request and the total row count.
    ///
    /// # Examples
    /// ```
    /// use pagination::PaginationMeta;
    ///
    /// let meta = PaginationMeta::compute(3, 20, 95);
    /// assert_eq!(meta.total_pages, 5);
    /// assert!(meta.has_next_page);
    /// assert!(meta.has_previous_page);
    /// ```
    #[must_use]
    pub const fn compute(page: u32, page_size: u32, total_items: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size as u64)
        };
        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next_page: (page as u64) < total_pages,
            has_previous_page: page > 1,
        }
    }
}

/// Rows for one page together with their [`PaginationMeta`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Rows on the current page.
    pub data: Vec<T>,
    /// Page metadata.
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    /// Transform each row while keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Wrap one page of rows with metadata derived from `total_items`.
///
/// `page` and `page_size` are trusted as already validated, typically via
/// [`PageRequest`].
///
/// # Examples
/// ```
/// use pagination::paginate_result;
///
/// let page = paginate_result(vec!["a", "b"], 2, 1, 20);
/// assert_eq!(page.pagination.total_pages, 1);
/// assert!(!page.pagination.has_next_page);
/// ```
#[must_use]
pub fn paginate_result<T>(
    rows: Vec<T>,
    total_items: u64,
    page: u32,
    page_size: u32,
) -> Paginated<T> {
    Paginated {
        data: rows,
        pagination: PaginationMeta::compute(page, page_size, total_items),
    }
}
