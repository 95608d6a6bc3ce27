//! Composable query descriptions over one entity type.
//!
//! A [`Specification`] bundles an optional filter predicate, eager-load
//! hints, at most one sort key, and an optional paging window. It is built
//! once through [`SpecificationBuilder`] and never mutated afterwards; the
//! [`evaluator`] turns it into rows.
//!
//! A specification without criteria and without paging selects the entire
//! table. Callers that list unbounded collections should page them.

pub mod evaluator;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use pagination::{PageRequest, PageRequestError, PagingWindow};
use thiserror::Error;

use crate::domain::ports::Snapshot;

pub use evaluator::{QuerySet, Queryable, evaluate};

/// Filter predicate. `None` on a specification means "match everything".
pub type Criteria<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

type Loader<E> = Arc<dyn Fn(&mut E, &Snapshot) + Send + Sync>;
type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// Eager-load hint: fills one relation of a row from the snapshot being
/// queried. Loading never changes which rows are selected.
pub struct Include<E> {
    name: &'static str,
    load: Loader<E>,
}

impl<E> Include<E> {
    /// Named loader for one relation.
    pub fn new(name: &'static str, load: impl Fn(&mut E, &Snapshot) + Send + Sync + 'static) -> Self {
        Self {
            name,
            load: Arc::new(load),
        }
    }

    /// Relation name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fill the relation on `row`.
    pub fn load(&self, row: &mut E, snapshot: &Snapshot) {
        (self.load)(row, snapshot);
    }
}

impl<E> Clone for Include<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            load: Arc::clone(&self.load),
        }
    }
}

/// Sort key extracted from a row.
pub struct SortKey<E> {
    compare: Comparator<E>,
}

impl<E> SortKey<E> {
    /// Order rows by the value `key` extracts.
    pub fn by<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(move |left, right| key(left).cmp(&key(right))),
        }
    }

    /// Compare two rows in the requested direction.
    pub fn compare(&self, left: &E, right: &E, direction: SortDirection) -> Ordering {
        match direction {
            SortDirection::Ascending => (self.compare)(left, right),
            SortDirection::Descending => (self.compare)(right, left),
        }
    }
}

impl<E> Clone for SortKey<E> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
        }
    }
}

/// Sort direction of a specification's order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest key first.
    Ascending,
    /// Largest key first.
    Descending,
}

/// Errors rejected when a specification is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecificationError {
    /// Both an ascending and a descending order key were requested.
    #[error("a specification may order ascending or descending, not both")]
    ConflictingOrder,
    /// The paging window is invalid.
    #[error(transparent)]
    InvalidPaging(#[from] PageRequestError),
}

/// Immutable query description over `E`.
pub struct Specification<E> {
    criteria: Option<Criteria<E>>,
    includes: Vec<Include<E>>,
    order: Option<(SortKey<E>, SortDirection)>,
    paging: Option<PageRequest>,
}

impl<E> Clone for Specification<E> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
            paging: self.paging,
        }
    }
}

impl<E> fmt::Debug for Specification<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("criteria", &self.criteria.is_some())
            .field(
                "includes",
                &self.includes.iter().map(Include::name).collect::<Vec<_>>(),
            )
            .field("order", &self.order.as_ref().map(|(_, direction)| *direction))
            .field("paging", &self.paging)
            .finish()
    }
}

impl<E> Default for Specification<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E> Specification<E> {
    /// Select every row, unfiltered and unpaged.
    pub fn all() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            order: None,
            paging: None,
        }
    }

    /// Start building a specification.
    pub fn builder() -> SpecificationBuilder<E> {
        SpecificationBuilder::default()
    }

    /// Filter predicate, if any.
    pub fn criteria(&self) -> Option<&Criteria<E>> {
        self.criteria.as_ref()
    }

    /// Eager-load hints in registration order.
    pub fn includes(&self) -> &[Include<E>] {
        &self.includes
    }

    /// Sort key and direction, if any.
    pub fn order(&self) -> Option<(&SortKey<E>, SortDirection)> {
        self.order.as_ref().map(|(key, direction)| (key, *direction))
    }

    /// Requested page, if paging is enabled.
    pub fn page(&self) -> Option<PageRequest> {
        self.paging
    }

    /// Row window, if paging is enabled.
    pub fn paging(&self) -> Option<PagingWindow> {
        self.paging.map(|page| page.window())
    }

    /// Whether `row` satisfies the criteria.
    pub fn is_satisfied_by(&self, row: &E) -> bool {
        self.criteria.as_ref().is_none_or(|criteria| criteria(row))
    }

    /// Same specification with paging disabled, as used for counts.
    #[must_use]
    pub fn without_paging(&self) -> Self {
        Self {
            paging: None,
            ..self.clone()
        }
    }
}

/// Collects specification parts and validates them on [`Self::build`].
pub struct SpecificationBuilder<E> {
    criteria: Option<Criteria<E>>,
    includes: Vec<Include<E>>,
    ascending: Option<SortKey<E>>,
    descending: Option<SortKey<E>>,
    paging: Option<(usize, usize)>,
}

impl<E> Default for SpecificationBuilder<E> {
    fn default() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            ascending: None,
            descending: None,
            paging: None,
        }
    }
}

impl<E: 'static> SpecificationBuilder<E> {
    /// Add a predicate. Repeated calls are combined with logical AND.
    #[must_use]
    pub fn with_criteria(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        let next: Criteria<E> = Arc::new(predicate);
        self.criteria = Some(match self.criteria.take() {
            Some(existing) => Arc::new(move |row: &E| existing(row) && next(row)),
            None => next,
        });
        self
    }

    /// Register an eager-load hint. Hints run in registration order.
    #[must_use]
    pub fn add_include(mut self, include: Include<E>) -> Self {
        self.includes.push(include);
        self
    }

    /// Sort ascending by `key`. Replaces an earlier ascending key.
    #[must_use]
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.ascending = Some(SortKey::by(key));
        self
    }

    /// Sort descending by `key`. Replaces an earlier descending key.
    #[must_use]
    pub fn order_by_descending<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        self.descending = Some(SortKey::by(key));
        self
    }

    /// Enable paging: skip `(page_index - 1) * page_size`, take `page_size`.
    #[must_use]
    pub fn apply_paging(mut self, page_size: usize, page_index: usize) -> Self {
        self.paging = Some((page_size, page_index));
        self
    }

    /// Enable paging from an already validated request.
    #[must_use]
    pub fn apply_page(self, page: PageRequest) -> Self {
        self.apply_paging(page.page_size(), page.page_index())
    }

    /// Validate and freeze the specification.
    ///
    /// # Errors
    /// [`SpecificationError::ConflictingOrder`] when both sort directions
    /// were requested, [`SpecificationError::InvalidPaging`] when the page
    /// index or size is zero.
    pub fn build(self) -> Result<Specification<E>, SpecificationError> {
        let order = match (self.ascending, self.descending) {
            (Some(_), Some(_)) => return Err(SpecificationError::ConflictingOrder),
            (Some(key), None) => Some((key, SortDirection::Ascending)),
            (None, Some(key)) => Some((key, SortDirection::Descending)),
            (None, None) => None,
        };
        let paging = self
            .paging
            .map(|(page_size, page_index)| PageRequest::new(page_index, page_size))
            .transpose()?;
        Ok(Specification {
            criteria: self.criteria,
            includes: self.includes,
            order,
            paging,
        })
    }
}
