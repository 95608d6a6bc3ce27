//! Ticket workflows: lookups, creation, replies, and status changes.
//!
//! Every call opens its own unit of work. Mutations invalidate the cached
//! doctor results they could stale, and only once the commit has succeeded.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::{debug, info};

use crate::domain::cache::{ResultCache, keys};
use crate::domain::dto::{CreateTicketRequest, Lookup, ReplyRequest, TicketDto};
use crate::domain::ports::map_store_error;
use crate::domain::service_support::{list_as, page_as};
use crate::domain::specs::{
    doctors_for_subject, messages_on_ticket, subjects_by_level_and_term, ticket_with_details,
    tickets_by_doctor, tickets_by_student, tickets_by_student_and_subject,
    tickets_with_details,
};
use crate::domain::ticket_id::{TicketSequenceLocks, ticket_id};
use crate::domain::{
    DoctorSubject, Error, Message, Role, Subject, Ticket, TicketStatus, UnitOfWork, UnitOfWorkFactory,
};

/// Ticket use cases for students, doctors, and administrators.
#[derive(Clone)]
pub struct TicketService {
    sessions: UnitOfWorkFactory,
    cache: ResultCache,
    clock: Arc<dyn Clock>,
    sequences: Arc<TicketSequenceLocks>,
}

impl TicketService {
    /// Create the service.
    ///
    /// `sequences` must be shared by every service instance that creates
    /// tickets against the same store.
    pub fn new(
        sessions: UnitOfWorkFactory,
        cache: ResultCache,
        clock: Arc<dyn Clock>,
        sequences: Arc<TicketSequenceLocks>,
    ) -> Self {
        Self {
            sessions,
            cache,
            clock,
            sequences,
        }
    }

    async fn find_detailed(uow: &mut UnitOfWork, id: &str) -> Result<Option<TicketDto>, Error> {
        let spec = ticket_with_details(id)?;
        Ok(list_as::<Ticket, TicketDto>(uow, &spec).await?.into_iter().next())
    }

    /// Ticket with participants, subject and conversation.
    pub async fn get_ticket(&self, id: &str) -> Result<Option<TicketDto>, Error> {
        Self::find_detailed(&mut self.sessions.begin(), id).await
    }

    /// Every ticket, newest first.
    pub async fn list_tickets(&self) -> Result<Vec<TicketDto>, Error> {
        list_as(&mut self.sessions.begin(), &tickets_with_details(None)?).await
    }

    /// One page of every ticket, newest first.
    pub async fn list_tickets_paged(&self, page: PageRequest) -> Result<Page<TicketDto>, Error> {
        page_as(&mut self.sessions.begin(), &tickets_with_details(Some(page))?).await
    }

    /// Subjects a student can raise tickets against in one level and term.
    pub async fn subjects_by_level_and_term(
        &self,
        level: u8,
        term: u8,
    ) -> Result<Vec<Lookup>, Error> {
        let spec = subjects_by_level_and_term(level, term)?;
        let subjects = self
            .sessions
            .begin()
            .repository::<Subject>()
            .get_all_matching(Some(&spec))
            .await
            .map_err(map_store_error)?;
        Ok(subjects
            .into_iter()
            .map(|s| Lookup {
                id: s.id,
                name: s.name,
            })
            .collect())
    }

    /// Doctors assigned to a subject.
    pub async fn doctors_by_subject(&self, subject_id: &str) -> Result<Vec<Lookup>, Error> {
        let spec = doctors_for_subject(subject_id)?;
        let assignments = self
            .sessions
            .begin()
            .repository::<DoctorSubject>()
            .get_all_matching(Some(&spec))
            .await
            .map_err(map_store_error)?;
        Ok(assignments
            .into_iter()
            .map(|a| Lookup {
                name: a.doctor.map(|d| d.name).unwrap_or_default(),
                id: a.doctor_id,
            })
            .collect())
    }

    /// Tickets raised by a student, newest first.
    pub async fn student_tickets(&self, student_id: &str) -> Result<Vec<TicketDto>, Error> {
        list_as(&mut self.sessions.begin(), &tickets_by_student(student_id, None)?).await
    }

    /// One page of a student's tickets.
    pub async fn student_tickets_paged(
        &self,
        student_id: &str,
        page: PageRequest,
    ) -> Result<Page<TicketDto>, Error> {
        let spec = tickets_by_student(student_id, Some(page))?;
        page_as(&mut self.sessions.begin(), &spec).await
    }

    /// Tickets addressed to a doctor, newest first.
    pub async fn doctor_tickets(&self, doctor_id: &str) -> Result<Vec<TicketDto>, Error> {
        list_as(&mut self.sessions.begin(), &tickets_by_doctor(doctor_id, None)?).await
    }

    /// One page of a doctor's tickets.
    pub async fn doctor_tickets_paged(
        &self,
        doctor_id: &str,
        page: PageRequest,
    ) -> Result<Page<TicketDto>, Error> {
        let spec = tickets_by_doctor(doctor_id, Some(page))?;
        page_as(&mut self.sessions.begin(), &spec).await
    }

    /// Raise a new ticket for `student_id`.
    ///
    /// The identifier numbers the student's tickets per subject from one.
    /// Creation for the same student and subject is serialised, so two
    /// concurrent requests never derive the same identifier.
    pub async fn create_ticket(
        &self,
        student_id: &str,
        request: CreateTicketRequest,
    ) -> Result<TicketDto, Error> {
        let mut uow = self.sessions.begin();
        let subject = uow
            .repository::<Subject>()
            .get_by_id(&request.subject_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                Error::invalid_request(format!("unknown subject `{}`", request.subject_id))
            })?;

        let id = {
            let _sequence = self.sequences.acquire(student_id, &subject.id).await;
            let tickets = uow.repository::<Ticket>();
            let prior = tickets
                .count(&tickets_by_student_and_subject(student_id, &subject.id)?)
                .await
                .map_err(map_store_error)?;
            let id = ticket_id(&subject.id, &request.doctor_id, student_id, prior);
            tickets.add(Ticket {
                id: id.clone(),
                title: request.title,
                body: request.body,
                group_number: request.group_number,
                status: TicketStatus::New,
                is_high_priority: false,
                created_at: self.clock.utc(),
                program: subject.program,
                student_id: student_id.to_owned(),
                doctor_id: request.doctor_id.clone(),
                subject_id: subject.id.clone(),
                level: request.level,
                term: request.term,
                student: None,
                doctor: None,
                subject: None,
                messages: Vec::new(),
            });
            uow.save_changes().await.map_err(map_store_error)?;
            id
        };

        info!(ticket_id = %id, student_id, doctor_id = %request.doctor_id, "ticket created");
        self.invalidate_ticket_results(&request.doctor_id);

        Self::find_detailed(&mut uow, &id)
            .await?
            .ok_or_else(|| Error::internal(format!("ticket `{id}` vanished after creation")))
    }

    /// Post a reply. Replies by administrators are flagged high priority.
    ///
    /// Returns whether a message was stored.
    pub async fn reply(
        &self,
        sender_id: &str,
        sender_role: Role,
        request: ReplyRequest,
    ) -> Result<bool, Error> {
        let mut uow = self.sessions.begin();
        let ticket = uow
            .repository::<Ticket>()
            .get_by_id(&request.ticket_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("ticket `{}` not found", request.ticket_id)))?;

        uow.repository::<Message>().add(Message {
            id: 0,
            body: request.body,
            sent_at: self.clock.utc(),
            is_high_priority: sender_role.is_admin(),
            ticket_id: ticket.id.clone(),
            sender_id: sender_id.to_owned(),
            sender: None,
        });
        let stored = uow.save_changes().await.map_err(map_store_error)? > 0;
        if stored {
            debug!(ticket_id = %ticket.id, sender_id, "reply stored");
            self.cache.remove_all(&keys::doctor_ticket_keys(&ticket.doctor_id));
        }
        Ok(stored)
    }

    /// Move a ticket to `status`. `Ok(None)` when the ticket does not exist.
    pub async fn update_status(
        &self,
        id: &str,
        status: TicketStatus,
    ) -> Result<Option<TicketDto>, Error> {
        let mut uow = self.sessions.begin();
        let tickets = uow.repository::<Ticket>();
        let Some(mut ticket) = tickets
            .get_by_id(&id.to_owned())
            .await
            .map_err(map_store_error)?
        else {
            return Ok(None);
        };

        ticket.status = status;
        let doctor_id = ticket.doctor_id.clone();
        tickets.update(ticket);
        uow.save_changes().await.map_err(map_store_error)?;
        debug!(ticket_id = id, %status, "ticket status changed");
        self.invalidate_ticket_results(&doctor_id);

        Self::find_detailed(&mut uow, id).await
    }

    /// Remove a ticket together with its messages. Returns whether anything
    /// was deleted.
    pub async fn delete_ticket(&self, id: &str) -> Result<bool, Error> {
        let mut uow = self.sessions.begin();
        let tickets = uow.repository::<Ticket>();
        let Some(ticket) = tickets
            .get_by_id(&id.to_owned())
            .await
            .map_err(map_store_error)?
        else {
            return Ok(false);
        };

        let messages = uow.repository::<Message>();
        let conversation = messages
            .get_all_matching(Some(&messages_on_ticket(&ticket.id)?))
            .await
            .map_err(map_store_error)?;
        for message in &conversation {
            messages.delete(&message.id).await.map_err(map_store_error)?;
        }
        tickets.delete(&ticket.id).await.map_err(map_store_error)?;
        let deleted = uow.save_changes().await.map_err(map_store_error)? > 0;
        if deleted {
            info!(ticket_id = id, messages = conversation.len(), "ticket deleted");
            self.invalidate_ticket_results(&ticket.doctor_id);
        }
        Ok(deleted)
    }

    fn invalidate_ticket_results(&self, doctor_id: &str) {
        self.cache.remove_all(&keys::doctor_ticket_keys(doctor_id));
        self.cache.remove(&keys::admin_analytics());
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
