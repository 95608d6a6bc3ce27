//! Ticket query specifications.

use pagination::PageRequest;
use serde::{Deserialize, Serialize};

use super::includes::{ticket_doctor, ticket_messages, ticket_student, ticket_subject};
use crate::domain::specification::{Specification, SpecificationBuilder, SpecificationError};
use crate::domain::{Message, Program, Ticket, TicketStatus};

fn with_page(
    builder: SpecificationBuilder<Ticket>,
    page: Option<PageRequest>,
) -> SpecificationBuilder<Ticket> {
    match page {
        Some(page) => builder.apply_page(page),
        None => builder,
    }
}

fn with_all_relations(builder: SpecificationBuilder<Ticket>) -> SpecificationBuilder<Ticket> {
    builder
        .add_include(ticket_student())
        .add_include(ticket_doctor())
        .add_include(ticket_subject())
        .add_include(ticket_messages())
}

/// One ticket with every relation loaded.
pub fn ticket_with_details(id: &str) -> Result<Specification<Ticket>, SpecificationError> {
    let id = id.to_owned();
    with_all_relations(Specification::builder().with_criteria(move |t: &Ticket| t.id == id)).build()
}

/// Every ticket with relations, newest first.
pub fn tickets_with_details(
    page: Option<PageRequest>,
) -> Result<Specification<Ticket>, SpecificationError> {
    let builder = with_all_relations(Specification::builder()).order_by_descending(|t| t.created_at);
    with_page(builder, page).build()
}

/// Tickets raised by one student, newest first.
pub fn tickets_by_student(
    student_id: &str,
    page: Option<PageRequest>,
) -> Result<Specification<Ticket>, SpecificationError> {
    let student_id = student_id.to_owned();
    let builder = Specification::builder()
        .with_criteria(move |t: &Ticket| t.student_id == student_id)
        .add_include(ticket_doctor())
        .add_include(ticket_subject())
        .add_include(ticket_messages())
        .order_by_descending(|t| t.created_at);
    with_page(builder, page).build()
}

/// Tickets addressed to one doctor, newest first.
pub fn tickets_by_doctor(
    doctor_id: &str,
    page: Option<PageRequest>,
) -> Result<Specification<Ticket>, SpecificationError> {
    let doctor_id = doctor_id.to_owned();
    let builder = Specification::builder()
        .with_criteria(move |t: &Ticket| t.doctor_id == doctor_id)
        .add_include(ticket_student())
        .add_include(ticket_subject())
        .add_include(ticket_messages())
        .order_by_descending(|t| t.created_at);
    with_page(builder, page).build()
}

/// Bare ticket rows of one doctor, for aggregates.
pub fn tickets_assigned_to(doctor_id: &str) -> Result<Specification<Ticket>, SpecificationError> {
    let doctor_id = doctor_id.to_owned();
    Specification::builder()
        .with_criteria(move |t: &Ticket| t.doctor_id == doctor_id)
        .build()
}

/// Bare ticket rows raised by or addressed to one user.
pub fn tickets_involving(user_id: &str) -> Result<Specification<Ticket>, SpecificationError> {
    let user_id = user_id.to_owned();
    Specification::builder()
        .with_criteria(move |t: &Ticket| t.student_id == user_id || t.doctor_id == user_id)
        .build()
}

/// Messages posted on one ticket.
pub fn messages_on_ticket(ticket_id: &str) -> Result<Specification<Message>, SpecificationError> {
    let ticket_id = ticket_id.to_owned();
    Specification::builder()
        .with_criteria(move |m: &Message| m.ticket_id == ticket_id)
        .build()
}

/// Messages posted by one user.
pub fn messages_sent_by(sender_id: &str) -> Result<Specification<Message>, SpecificationError> {
    let sender_id = sender_id.to_owned();
    Specification::builder()
        .with_criteria(move |m: &Message| m.sender_id == sender_id)
        .build()
}

/// Tickets, optionally at one level, with doctor and subject loaded for
/// rankings.
pub fn tickets_for_ranking(level: Option<u8>) -> Result<Specification<Ticket>, SpecificationError> {
    Specification::builder()
        .with_criteria(move |t: &Ticket| level.is_none_or(|level| t.level == level))
        .add_include(ticket_doctor())
        .add_include(ticket_subject())
        .build()
}

/// Tickets of one student for one subject; drives ticket numbering.
pub fn tickets_by_student_and_subject(
    student_id: &str,
    subject_id: &str,
) -> Result<Specification<Ticket>, SpecificationError> {
    let (student_id, subject_id) = (student_id.to_owned(), subject_id.to_owned());
    Specification::builder()
        .with_criteria(move |t: &Ticket| t.student_id == student_id && t.subject_id == subject_id)
        .build()
}

/// High-priority tickets, optionally within one program, newest first.
pub fn high_priority_tickets(
    program: Option<Program>,
    page: Option<PageRequest>,
) -> Result<Specification<Ticket>, SpecificationError> {
    let builder = with_all_relations(Specification::builder().with_criteria(move |t: &Ticket| {
        t.is_high_priority && program.is_none_or(|program| t.program == program)
    }))
    .order_by_descending(|t| t.created_at);
    with_page(builder, page).build()
}

/// Administrator ticket filter.
///
/// A non-blank `search_ticket_id` replaces every other criterion with a
/// substring match on the ticket id; `program` scoping applies either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminTicketFilter {
    /// Study year.
    pub level: Option<u8>,
    /// Term within the year.
    pub term: Option<u8>,
    /// Lifecycle state.
    pub status: Option<TicketStatus>,
    /// Addressed doctor.
    pub doctor_id: Option<String>,
    /// Subject raised against.
    pub subject_id: Option<String>,
    /// Substring of the ticket id.
    pub search_ticket_id: Option<String>,
    /// High-priority flag.
    pub is_high_priority: Option<bool>,
    /// Program the caller administers.
    pub program: Option<Program>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

impl AdminTicketFilter {
    /// Specification selecting the filtered tickets, newest first.
    pub fn specification(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Specification<Ticket>, SpecificationError> {
        let program = self.program;
        let mut builder = Specification::builder()
            .with_criteria(move |t: &Ticket| program.is_none_or(|program| t.program == program));

        builder = match non_blank(self.search_ticket_id.as_ref()) {
            Some(search) => builder.with_criteria(move |t: &Ticket| t.id.contains(search.as_str())),
            None => {
                let Self {
                    level,
                    term,
                    status,
                    is_high_priority,
                    ..
                } = *self;
                let doctor_id = non_blank(self.doctor_id.as_ref());
                let subject_id = non_blank(self.subject_id.as_ref());
                builder.with_criteria(move |t: &Ticket| {
                    level.is_none_or(|level| t.level == level)
                        && term.is_none_or(|term| t.term == term)
                        && status.is_none_or(|status| t.status == status)
                        && doctor_id.as_ref().is_none_or(|id| &t.doctor_id == id)
                        && subject_id.as_ref().is_none_or(|id| &t.subject_id == id)
                        && is_high_priority.is_none_or(|flag| t.is_high_priority == flag)
                })
            }
        };

        with_page(
            with_all_relations(builder).order_by_descending(|t| t.created_at),
            page,
        )
        .build()
    }
}
