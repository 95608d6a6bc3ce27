//! Seeding of a small helpdesk into a fresh in-memory store.

use std::sync::Arc;

use chrono::Utc;
use helpdesk::domain::{DoctorSubject, Program, Role, Subject, Ticket, TicketStatus, User};
use helpdesk::outbound::persistence::MemoryStore;
use helpdesk::{HelpdeskServices, HelpdeskSettings};
use mockable::DefaultClock;

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_owned(),
        user_name: id.to_owned(),
        name: format!("{role} {id}"),
        role,
        program: Some(Program::Bis),
    }
}

pub fn subject(id: &str, level: u8) -> Subject {
    Subject {
        id: id.to_owned(),
        name: format!("{id} course"),
        level,
        term: 1,
        program: Program::Bis,
    }
}

pub fn ticket(id: &str, student_id: &str, doctor_id: &str, subject_id: &str) -> Ticket {
    Ticket {
        id: id.to_owned(),
        title: "Exam dates".to_owned(),
        body: "When is the midterm?".to_owned(),
        group_number: 3,
        status: TicketStatus::New,
        is_high_priority: false,
        created_at: Utc::now(),
        program: Program::Bis,
        student_id: student_id.to_owned(),
        doctor_id: doctor_id.to_owned(),
        subject_id: subject_id.to_owned(),
        level: 1,
        term: 1,
        student: None,
        doctor: None,
        subject: None,
        messages: Vec::new(),
    }
}

/// Store holding student `20201234`, doctors `D01` and `D02`, subjects
/// `BIS101`, `BIS102` and `BIS103`, with `D01` teaching `BIS101` only.
pub async fn seeded_store(store: &MemoryStore) {
    store
        .seed([
            user("20201234", Role::Student),
            user("D01", Role::Doctor),
            user("D02", Role::Doctor),
        ])
        .await
        .expect("seed users");
    store
        .seed([subject("BIS101", 1), subject("BIS102", 1), subject("BIS103", 2)])
        .await
        .expect("seed subjects");
    store
        .seed([DoctorSubject::new("D01", "BIS101")])
        .await
        .expect("seed assignments");
}

/// Services over [`seeded_store`] reading the wall clock.
pub async fn seeded_services() -> (HelpdeskServices, Arc<MemoryStore>) {
    let (services, store) =
        HelpdeskServices::in_memory(Arc::new(DefaultClock), &HelpdeskSettings::default());
    seeded_store(&store).await;
    (services, store)
}
