//! Named specifications used by the services.
//!
//! Each constructor returns a ready-to-evaluate [`Specification`]. Paged
//! variants take an optional [`pagination::PageRequest`]; counting callers
//! pass `None` or use [`Specification::without_paging`].
//!
//! [`Specification`]: crate::domain::Specification
//! [`Specification::without_paging`]: crate::domain::Specification::without_paging

mod includes;
mod ticket_specs;
mod user_specs;

pub use ticket_specs::{
    AdminTicketFilter, high_priority_tickets, messages_on_ticket, messages_sent_by,
    ticket_with_details, tickets_assigned_to, tickets_by_doctor, tickets_by_student,
    tickets_by_student_and_subject, tickets_for_ranking, tickets_involving, tickets_with_details,
};
pub use user_specs::{
    doctor_subjects_of, doctors_for_subject, subjects_by_level_and_term, subjects_in_program,
    user_search,
};
