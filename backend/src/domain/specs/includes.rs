//! Eager-load hints for entity relations.

use crate::domain::specification::Include;
use crate::domain::{DoctorSubject, Message, Subject, Ticket, User};

pub(super) fn ticket_student() -> Include<Ticket> {
    Include::new("student", |ticket: &mut Ticket, snapshot| {
        ticket.student = snapshot.find::<User>(&ticket.student_id).cloned();
    })
}

pub(super) fn ticket_doctor() -> Include<Ticket> {
    Include::new("doctor", |ticket: &mut Ticket, snapshot| {
        ticket.doctor = snapshot.find::<User>(&ticket.doctor_id).cloned();
    })
}

pub(super) fn ticket_subject() -> Include<Ticket> {
    Include::new("subject", |ticket: &mut Ticket, snapshot| {
        ticket.subject = snapshot.find::<Subject>(&ticket.subject_id).cloned();
    })
}

/// Messages oldest first, each with its sender loaded.
pub(super) fn ticket_messages() -> Include<Ticket> {
    Include::new("messages", |ticket: &mut Ticket, snapshot| {
        let mut messages: Vec<Message> = snapshot
            .rows::<Message>()
            .filter(|message| message.ticket_id == ticket.id)
            .cloned()
            .map(|mut message| {
                message.sender = snapshot.find::<User>(&message.sender_id).cloned();
                message
            })
            .collect();
        messages.sort_by_key(|message| (message.sent_at, message.id));
        ticket.messages = messages;
    })
}

pub(super) fn assignment_doctor() -> Include<DoctorSubject> {
    Include::new("doctor", |assignment: &mut DoctorSubject, snapshot| {
        assignment.doctor = snapshot.find::<User>(&assignment.doctor_id).cloned();
    })
}

pub(super) fn assignment_subject() -> Include<DoctorSubject> {
    Include::new("subject", |assignment: &mut DoctorSubject, snapshot| {
        assignment.subject = snapshot.find::<Subject>(&assignment.subject_id).cloned();
    })
}
