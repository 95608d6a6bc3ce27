//! Page window and paged result envelope primitives.
//!
//! Callers describe a page with a one-based [`PageRequest`]. The request is
//! validated on construction so the derived [`PagingWindow`] is always well
//! formed: `skip = (page_index - 1) * page_size` and `take = page_size`.
//! Query results travel back to adapters inside a [`Page`] envelope that
//! carries the unpaged total alongside the requested window.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size applied when callers do not supply one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Validation errors returned when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page indices are one-based.
    #[error("page index must be at least 1 (got {index})")]
    IndexOutOfRange {
        /// Rejected page index.
        index: usize,
    },
    /// A page must hold at least one row.
    #[error("page size must be at least 1 (got {size})")]
    SizeOutOfRange {
        /// Rejected page size.
        size: usize,
    },
}

/// Validated one-based page coordinates.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(3, 20).expect("valid page");
/// let window = request.window();
/// assert_eq!(window.skip(), 40);
/// assert_eq!(window.take(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PageRequestDto", into = "PageRequestDto")]
pub struct PageRequest {
    page_index: usize,
    page_size: usize,
}

/// Wire form of [`PageRequest`]; validated through [`PageRequest::new`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRequestDto {
    page_index: usize,
    page_size: usize,
}

impl From<PageRequest> for PageRequestDto {
    fn from(value: PageRequest) -> Self {
        Self {
            page_index: value.page_index,
            page_size: value.page_size,
        }
    }
}

impl TryFrom<PageRequestDto> for PageRequest {
    type Error = PageRequestError;

    fn try_from(value: PageRequestDto) -> Result<Self, Self::Error> {
        Self::new(value.page_index, value.page_size)
    }
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either coordinate is zero.
    pub const fn new(page_index: usize, page_size: usize) -> Result<Self, PageRequestError> {
        if page_index == 0 {
            return Err(PageRequestError::IndexOutOfRange { index: page_index });
        }
        if page_size == 0 {
            return Err(PageRequestError::SizeOutOfRange { size: page_size });
        }
        Ok(Self {
            page_index,
            page_size,
        })
    }

    /// First page with the default size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            page_index: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// One-based page index.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Row window covered by this page.
    #[must_use]
    pub const fn window(&self) -> PagingWindow {
        PagingWindow {
            skip: self.page_index.saturating_sub(1).saturating_mul(self.page_size),
            take: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Zero-based `(skip, take)` window derived from a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PagingWindow {
    skip: usize,
    take: usize,
}

impl PagingWindow {
    /// Number of leading rows to discard.
    #[must_use]
    pub const fn skip(&self) -> usize {
        self.skip
    }

    /// Maximum number of rows to keep after skipping.
    #[must_use]
    pub const fn take(&self) -> usize {
        self.take
    }

    /// Apply the window to an iterator.
    pub fn apply<I>(&self, rows: I) -> std::iter::Take<std::iter::Skip<I::IntoIter>>
    where
        I: IntoIterator,
    {
        rows.into_iter().skip(self.skip).take(self.take)
    }
}

impl From<PageRequest> for PagingWindow {
    fn from(value: PageRequest) -> Self {
        value.window()
    }
}

/// Paged result envelope returned to adapters.
///
/// `total_count` is the size of the unpaged result set, so clients can render
/// page navigation without a second request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    data: Vec<T>,
    total_count: usize,
    page_index: usize,
    page_size: usize,
    total_pages: usize,
}

impl<T> Page<T> {
    /// Wrap a page of rows together with the unpaged total.
    #[must_use]
    pub const fn new(data: Vec<T>, total_count: usize, request: PageRequest) -> Self {
        Self {
            data,
            total_count,
            page_index: request.page_index,
            page_size: request.page_size,
            total_pages: total_count.div_ceil(request.page_size),
        }
    }

    /// Rows on this page.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consume the envelope and return the rows.
    #[must_use]
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Size of the unpaged result set.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    /// One-based index of this page.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `total_count` rows, rounded up.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Map every row while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_index: self.page_index,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}
