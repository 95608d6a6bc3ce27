//! System-wide ticket analytics for administrators.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use tracing::debug;

use crate::domain::cache::{ResultCache, keys};
use crate::domain::dto::{
    AdminAnalytics, DoctorTicketCount, Period, SubjectTicketCount, TicketCounts,
    TicketCountsQuery,
};
use crate::domain::ports::map_store_error;
use crate::domain::specification::Specification;
use crate::domain::specs::tickets_for_ranking;
use crate::domain::{Error, Message, Role, Ticket, TicketStatus, UnitOfWork, UnitOfWorkFactory, User};

/// Length of the rankings embedded in [`AdminAnalytics`].
pub const TOP_RANKING_SIZE: usize = 10;

/// Aggregates over every ticket and user.
#[derive(Clone)]
pub struct AnalyticsService {
    sessions: UnitOfWorkFactory,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
}

/// Earliest creation instant inside `period`, measured back from `now`.
fn period_start(period: Period, now: DateTime<Utc>) -> DateTime<Utc> {
    match period {
        Period::Today => now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(now, |midnight| midnight.and_utc()),
        Period::Week => now - Duration::days(7),
        Period::Month => now - Duration::days(30),
    }
}

fn report_spec(
    query: &TicketCountsQuery,
    now: DateTime<Utc>,
) -> Result<Specification<Ticket>, Error> {
    let since = query.period.map(|period| period_start(period, now));
    let from = match (since, query.from) {
        (Some(left), Some(right)) => Some(left.max(right)),
        (left, right) => left.or(right),
    };
    let to = query.to;
    if let Some((from, to)) = from.zip(to).filter(|(from, to)| from > to) {
        return Err(Error::invalid_request(format!(
            "`from` ({from}) is after `to` ({to})"
        )));
    }

    let TicketCountsQuery {
        program, level, ..
    } = *query;
    let subject_id = query.subject_id.clone();
    let doctor_id = query.doctor_id.clone();
    Ok(Specification::builder()
        .with_criteria(move |t: &Ticket| {
            program.is_none_or(|program| t.program == program)
                && level.is_none_or(|level| t.level == level)
                && subject_id.as_ref().is_none_or(|id| &t.subject_id == id)
                && doctor_id.as_ref().is_none_or(|id| &t.doctor_id == id)
                && from.is_none_or(|from| t.created_at >= from)
                && to.is_none_or(|to| t.created_at <= to)
        })
        .build()?)
}

impl AnalyticsService {
    /// Create the service. `clock` anchors relative reporting periods.
    pub fn new(sessions: UnitOfWorkFactory, cache: ResultCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions,
            cache,
            clock,
        }
    }

    async fn ranked_tickets(uow: &mut UnitOfWork, level: Option<u8>) -> Result<Vec<Ticket>, Error> {
        uow.repository::<Ticket>()
            .get_all_matching(Some(&tickets_for_ranking(level)?))
            .await
            .map_err(map_store_error)
    }

    /// Dashboard of ticket distribution, rankings and user totals. Cached.
    pub async fn admin_analytics(&self) -> Result<AdminAnalytics, Error> {
        let key = keys::admin_analytics();
        if let Some(cached) = self.cache.try_get::<AdminAnalytics>(&key) {
            return Ok(cached);
        }

        let mut uow = self.sessions.begin();
        let tickets = Self::ranked_tickets(&mut uow, None).await?;
        let users = uow.repository::<User>().get_all().await.map_err(map_store_error)?;

        let mut tickets_by_level: BTreeMap<String, usize> = BTreeMap::new();
        let mut tickets_by_status: BTreeMap<String, usize> = BTreeMap::new();
        for ticket in &tickets {
            *tickets_by_level.entry(format!("Level {}", ticket.level)).or_default() += 1;
            *tickets_by_status.entry(ticket.status.as_str().to_owned()).or_default() += 1;
        }
        let with_role = |role: Role| users.iter().filter(|u| u.role == role).count();

        let analytics = AdminAnalytics {
            tickets_by_level,
            tickets_by_status,
            total_tickets: tickets.len(),
            total_users: users.len(),
            total_doctors: with_role(Role::Doctor),
            total_students: with_role(Role::Student),
            top_doctors_by_tickets: rank_doctors(&tickets, TOP_RANKING_SIZE),
            top_subjects_by_tickets: rank_subjects(&tickets, TOP_RANKING_SIZE),
        };
        debug!(total_tickets = analytics.total_tickets, "admin analytics computed");
        self.cache
            .set(key, analytics.clone(), self.cache.ttls().admin_analytics);
        Ok(analytics)
    }

    /// Doctors with the most tickets, optionally at one level.
    pub async fn top_doctors(
        &self,
        limit: usize,
        level: Option<u8>,
    ) -> Result<Vec<DoctorTicketCount>, Error> {
        let tickets = Self::ranked_tickets(&mut self.sessions.begin(), level).await?;
        Ok(rank_doctors(&tickets, limit))
    }

    /// Subjects with the most tickets, optionally at one level.
    pub async fn top_subjects(
        &self,
        limit: usize,
        level: Option<u8>,
    ) -> Result<Vec<SubjectTicketCount>, Error> {
        let tickets = Self::ranked_tickets(&mut self.sessions.begin(), level).await?;
        Ok(rank_subjects(&tickets, limit))
    }

    /// Ticket totals under `query`. Not cached.
    pub async fn ticket_counts(&self, query: &TicketCountsQuery) -> Result<TicketCounts, Error> {
        let spec = report_spec(query, self.clock.utc())?;
        let mut uow = self.sessions.begin();
        let tickets = uow
            .repository::<Ticket>()
            .get_all_matching(Some(&spec))
            .await
            .map_err(map_store_error)?;
        let replied: HashSet<String> = uow
            .repository::<Message>()
            .get_all()
            .await
            .map_err(map_store_error)?
            .into_iter()
            .map(|message| message.ticket_id)
            .collect();

        let with_status = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();
        let replied_tickets = tickets.iter().filter(|t| replied.contains(&t.id)).count();
        Ok(TicketCounts {
            total_tickets: tickets.len(),
            new_tickets: with_status(TicketStatus::New),
            in_progress_tickets: with_status(TicketStatus::InProgress),
            closed_tickets: with_status(TicketStatus::Closed),
            replied_tickets,
            unreplied_tickets: tickets.len() - replied_tickets,
            high_priority_tickets: tickets.iter().filter(|t| t.is_high_priority).count(),
        })
    }
}

/// Sort by descending count; ties keep ascending id order.
fn top<T>(mut rows: Vec<T>, limit: usize, count: impl Fn(&T) -> usize) -> Vec<T> {
    rows.sort_by(|left, right| count(right).cmp(&count(left)));
    rows.truncate(limit);
    rows
}

fn rank_doctors(tickets: &[Ticket], limit: usize) -> Vec<DoctorTicketCount> {
    let mut by_doctor: BTreeMap<&str, DoctorTicketCount> = BTreeMap::new();
    for ticket in tickets {
        let entry = by_doctor
            .entry(ticket.doctor_id.as_str())
            .or_insert_with(|| DoctorTicketCount {
                doctor_id: ticket.doctor_id.clone(),
                doctor_name: ticket.doctor.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
                ticket_count: 0,
                new_count: 0,
                in_progress_count: 0,
                closed_count: 0,
            });
        entry.ticket_count += 1;
        match ticket.status {
            TicketStatus::New => entry.new_count += 1,
            TicketStatus::InProgress => entry.in_progress_count += 1,
            TicketStatus::Closed => entry.closed_count += 1,
        }
    }
    top(by_doctor.into_values().collect(), limit, |d| d.ticket_count)
}

fn rank_subjects(tickets: &[Ticket], limit: usize) -> Vec<SubjectTicketCount> {
    let mut by_subject: BTreeMap<&str, SubjectTicketCount> = BTreeMap::new();
    for ticket in tickets {
        by_subject
            .entry(ticket.subject_id.as_str())
            .or_insert_with(|| SubjectTicketCount {
                subject_id: ticket.subject_id.clone(),
                subject_name: ticket.subject.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
                level: ticket.subject.as_ref().map_or(ticket.level, |s| s.level),
                ticket_count: 0,
            })
            .ticket_count += 1;
    }
    top(by_subject.into_values().collect(), limit, |s| s.ticket_count)
}

#[cfg(test)]
#[path = "analytics_service_tests.rs"]
mod tests;
