//! Applies a [`Specification`] to a queryable row source.
//!
//! Steps run in a fixed order, each only when the specification sets it:
//! criteria, eager loads (in registration order), sort, then the paging
//! window. Evaluation is pure: the same specification over the same snapshot
//! always yields the same rows.

use pagination::PagingWindow;

use crate::domain::entity::Entity;
use crate::domain::ports::Snapshot;

use super::{Criteria, Include, SortDirection, SortKey, Specification};

/// Row source that can be narrowed step by step.
pub trait Queryable<E>: Sized {
    /// Keep rows satisfying `criteria`.
    #[must_use]
    fn filter(self, criteria: &Criteria<E>) -> Self;

    /// Fill one relation on every row.
    #[must_use]
    fn include(self, include: &Include<E>) -> Self;

    /// Stable sort by `key`.
    #[must_use]
    fn sort(self, key: &SortKey<E>, direction: SortDirection) -> Self;

    /// Keep only the rows inside `window`.
    #[must_use]
    fn window(self, window: PagingWindow) -> Self;
}

/// Evaluate `spec` against `base`.
pub fn evaluate<E, Q: Queryable<E>>(base: Q, spec: &Specification<E>) -> Q {
    let mut query = base;
    if let Some(criteria) = spec.criteria() {
        query = query.filter(criteria);
    }
    for include in spec.includes() {
        query = query.include(include);
    }
    if let Some((key, direction)) = spec.order() {
        query = query.sort(key, direction);
    }
    if let Some(window) = spec.paging() {
        query = query.window(window);
    }
    query
}

/// Rows of one entity type drawn from a snapshot.
///
/// The snapshot is kept alongside the rows so eager loads can resolve
/// relations against the same point in time.
#[derive(Debug)]
pub struct QuerySet<'s, E> {
    rows: Vec<E>,
    snapshot: &'s Snapshot,
}

impl<'s, E: Entity> QuerySet<'s, E> {
    /// Every row of `E` in key order.
    pub fn from_snapshot(snapshot: &'s Snapshot) -> Self {
        Self {
            rows: snapshot.rows::<E>().cloned().collect(),
            snapshot,
        }
    }

    /// Rows of `E` satisfying `criteria`, without copying the others.
    pub fn matching(snapshot: &'s Snapshot, criteria: Option<&Criteria<E>>) -> Self {
        let rows = snapshot
            .rows::<E>()
            .filter(|row| criteria.is_none_or(|criteria| criteria(row)))
            .cloned()
            .collect();
        Self { rows, snapshot }
    }
}

impl<E> QuerySet<'_, E> {
    /// Number of rows currently selected.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are selected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Materialise the selected rows.
    pub fn into_vec(self) -> Vec<E> {
        self.rows
    }
}

impl<E> Queryable<E> for QuerySet<'_, E> {
    fn filter(mut self, criteria: &Criteria<E>) -> Self {
        self.rows.retain(|row| criteria(row));
        self
    }

    fn include(mut self, include: &Include<E>) -> Self {
        for row in &mut self.rows {
            include.load(row, self.snapshot);
        }
        self
    }

    fn sort(mut self, key: &SortKey<E>, direction: SortDirection) -> Self {
        self.rows
            .sort_by(|left, right| key.compare(left, right, direction));
        self
    }

    fn window(mut self, window: PagingWindow) -> Self {
        self.rows = window.apply(self.rows).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    //! Step ordering and paging coverage for the evaluator.
    use super::*;
    use crate::domain::test_fixtures::{snapshot_with, subject, ticket};
    use crate::domain::{Subject, Ticket};
    use chrono::Duration;
    use rstest::{fixture, rstest};

    #[fixture]
    fn twelve_subjects() -> Snapshot {
        let rows = (1..=12).map(|n| subject(&format!("S{n:02}"), n % 4 + 1));
        snapshot_with(rows)
    }

    #[rstest]
    fn criteria_less_specification_returns_every_row(twelve_subjects: Snapshot) {
        let rows = evaluate(
            QuerySet::<Subject>::from_snapshot(&twelve_subjects),
            &Specification::all(),
        )
        .into_vec();
        let everything: Vec<Subject> = twelve_subjects.rows::<Subject>().cloned().collect();
        assert_eq!(rows, everything);
    }

    #[rstest]
    fn paging_takes_one_window_after_sorting(twelve_subjects: Snapshot) {
        let spec = Specification::<Subject>::builder()
            .order_by_descending(|s| s.id.clone())
            .apply_paging(5, 2)
            .build()
            .expect("valid spec");
        let ids: Vec<String> = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec)
            .into_vec()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["S07", "S06", "S05", "S04", "S03"]);
    }

    #[rstest]
    fn last_page_may_be_short(twelve_subjects: Snapshot) {
        let spec = Specification::<Subject>::builder()
            .apply_paging(5, 3)
            .build()
            .expect("valid spec");
        let rows = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec);
        assert_eq!(rows.len(), 2);
    }

    #[rstest]
    fn filter_runs_before_paging(twelve_subjects: Snapshot) {
        let spec = Specification::<Subject>::builder()
            .with_criteria(|s| s.level == 1)
            .apply_paging(2, 1)
            .build()
            .expect("valid spec");
        let rows = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec).into_vec();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|s| s.level == 1));
    }

    #[rstest]
    fn sorting_is_stable_for_equal_keys(twelve_subjects: Snapshot) {
        let spec = Specification::<Subject>::builder()
            .order_by(|s| s.level)
            .build()
            .expect("valid spec");
        let rows = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec).into_vec();
        let level_one: Vec<&str> = rows
            .iter()
            .filter(|s| s.level == 1)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(level_one, ["S04", "S08", "S12"]);
    }

    #[rstest]
    fn includes_fill_relations_without_changing_rows() {
        let base = ticket("BIS101-D01-1234-1", "S1234", "D01", "BIS101");
        let later = Ticket {
            id: "BIS101-D01-1234-2".to_owned(),
            created_at: base.created_at + Duration::minutes(5),
            ..base.clone()
        };
        let mut snapshot = snapshot_with([base, later]);
        snapshot
            .table_mut::<Subject>()
            .expect("subjects table")
            .insert(subject("BIS101", 1))
            .expect("insert subject");

        let spec = Specification::<Ticket>::builder()
            .add_include(Include::new("subject", |ticket: &mut Ticket, snapshot| {
                ticket.subject = snapshot.find::<Subject>(&ticket.subject_id).cloned();
            }))
            .order_by_descending(|t| t.created_at)
            .build()
            .expect("valid spec");
        let rows = evaluate(QuerySet::from_snapshot(&snapshot), &spec).into_vec();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "BIS101-D01-1234-2");
        assert!(rows.iter().all(|t| t.subject.is_some()));
    }

    #[rstest]
    fn evaluation_is_repeatable(twelve_subjects: Snapshot) {
        let spec = Specification::<Subject>::builder()
            .with_criteria(|s| s.level > 2)
            .order_by(|s| s.name.clone())
            .apply_paging(3, 1)
            .build()
            .expect("valid spec");
        let first = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec).into_vec();
        let second = evaluate(QuerySet::from_snapshot(&twelve_subjects), &spec).into_vec();
        assert_eq!(first, second);
    }
}
