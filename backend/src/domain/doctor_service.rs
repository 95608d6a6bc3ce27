//! Doctor dashboard: ticket statistics and subject breakdown.
//!
//! Both results are cached per doctor; ticket and assignment mutations
//! elsewhere remove the entries.

use std::collections::HashMap;

use crate::domain::cache::{ResultCache, keys};
use crate::domain::dto::{DoctorStats, DoctorSubjectDetail};
use crate::domain::ports::map_store_error;
use crate::domain::specs::{doctor_subjects_of, tickets_assigned_to};
use crate::domain::{DoctorSubject, Error, Ticket, TicketStatus, UnitOfWork, UnitOfWorkFactory};

/// Per-doctor read models.
#[derive(Clone)]
pub struct DoctorService {
    sessions: UnitOfWorkFactory,
    cache: ResultCache,
}

impl DoctorService {
    /// Create the service.
    pub fn new(sessions: UnitOfWorkFactory, cache: ResultCache) -> Self {
        Self { sessions, cache }
    }

    async fn doctor_tickets(uow: &mut UnitOfWork, doctor_id: &str) -> Result<Vec<Ticket>, Error> {
        uow.repository::<Ticket>()
            .get_all_matching(Some(&tickets_assigned_to(doctor_id)?))
            .await
            .map_err(map_store_error)
    }

    /// Ticket counts of `doctor_id` by status.
    pub async fn stats(&self, doctor_id: &str) -> Result<DoctorStats, Error> {
        let key = keys::doctor_stats(doctor_id);
        if let Some(cached) = self.cache.try_get::<DoctorStats>(&key) {
            return Ok(cached);
        }

        let tickets = Self::doctor_tickets(&mut self.sessions.begin(), doctor_id).await?;
        let count = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();
        let stats = DoctorStats {
            new_tickets: count(TicketStatus::New),
            in_progress_tickets: count(TicketStatus::InProgress),
            closed_tickets: count(TicketStatus::Closed),
            total_tickets: tickets.len(),
        };

        self.cache.set(key, stats, self.cache.ttls().doctor_stats);
        Ok(stats)
    }

    /// Subjects of `doctor_id`, ordered by id, each with the number of
    /// tickets addressed to the doctor for it.
    pub async fn subject_details(&self, doctor_id: &str) -> Result<Vec<DoctorSubjectDetail>, Error> {
        let key = keys::doctor_subjects_detail(doctor_id);
        if let Some(cached) = self.cache.try_get::<Vec<DoctorSubjectDetail>>(&key) {
            return Ok(cached);
        }

        let mut uow = self.sessions.begin();
        let assignments = uow
            .repository::<DoctorSubject>()
            .get_all_matching(Some(&doctor_subjects_of(doctor_id)?))
            .await
            .map_err(map_store_error)?;
        let mut per_subject: HashMap<String, usize> = HashMap::new();
        for ticket in Self::doctor_tickets(&mut uow, doctor_id).await? {
            *per_subject.entry(ticket.subject_id).or_default() += 1;
        }

        let mut details: Vec<DoctorSubjectDetail> = assignments
            .into_iter()
            .filter_map(|assignment| {
                let subject = assignment.subject?;
                Some(DoctorSubjectDetail {
                    total_tickets: per_subject.get(&subject.id).copied().unwrap_or_default(),
                    subject_id: subject.id,
                    subject_name: subject.name,
                    level: subject.level,
                    term: subject.term,
                })
            })
            .collect();
        details.sort_by(|left, right| left.subject_id.cmp(&right.subject_id));

        self.cache
            .set(key, details.clone(), self.cache.ttls().doctor_subjects_detail);
        Ok(details)
    }
}
