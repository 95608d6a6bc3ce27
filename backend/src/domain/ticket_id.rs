//! Ticket identifier derivation.
//!
//! Identifiers read `{subject}-{doctor}-{last4(student)}-{n}` where `n` is
//! one more than the number of tickets the student already holds for the
//! subject. Counting and inserting must not interleave for the same
//! `(student, subject)` pair, so callers hold a [`TicketSequenceLocks`]
//! guard from the count until the insert has committed.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Last four characters of `student_id`, or all of it when shorter.
pub fn student_suffix(student_id: &str) -> &str {
    let chars = student_id.chars().count();
    match student_id.char_indices().nth(chars.saturating_sub(4)) {
        Some((start, _)) => student_id.get(start..).unwrap_or(student_id),
        None => student_id,
    }
}

/// Identifier of the `prior_count + 1`-th ticket of a student for a subject.
pub fn ticket_id(subject_id: &str, doctor_id: &str, student_id: &str, prior_count: usize) -> String {
    format!(
        "{subject_id}-{doctor_id}-{}-{}",
        student_suffix(student_id),
        prior_count.saturating_add(1)
    )
}

/// Async locks serialising ticket creation per `(student, subject)` pair.
#[derive(Debug, Default)]
pub struct TicketSequenceLocks {
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl TicketSequenceLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the `(student, subject)` sequence.
    pub async fn acquire(&self, student_id: &str, subject_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry((student_id.to_owned(), subject_id.to_owned()))
            .or_default()
            .value()
            .clone();
        lock.lock_owned().await
    }
}
