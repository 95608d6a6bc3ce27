//! Row builders shared by domain unit tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;

use super::cache::{CacheTtls, ResultCache};
use super::entity::Entity;
use super::ports::Snapshot;
use super::unit_of_work::{CommitPolicy, UnitOfWorkFactory};
use super::{DoctorSubject, Message, Program, Role, Subject, Ticket, TicketStatus, User};
use crate::outbound::cache::InMemoryCacheStore;
use crate::outbound::persistence::MemoryStore;
use crate::test_support::MutableClock;

/// Fixed instant the fixtures are stamped with.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0)
        .single()
        .expect("valid fixture instant")
}

pub fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_owned(),
        user_name: id.to_lowercase(),
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
        title: "Lab question".to_owned(),
        body: "How is the second exercise graded?".to_owned(),
        group_number: 1,
        status: TicketStatus::New,
        is_high_priority: false,
        created_at: fixed_now(),
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

pub fn message(ticket_id: &str, sender_id: &str, body: &str) -> Message {
    Message {
        id: 0,
        body: body.to_owned(),
        sent_at: fixed_now(),
        is_high_priority: false,
        ticket_id: ticket_id.to_owned(),
        sender_id: sender_id.to_owned(),
        sender: None,
    }
}

/// Snapshot holding exactly `rows`.
pub fn snapshot_with<E: Entity>(rows: impl IntoIterator<Item = E>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let table = snapshot.table_mut::<E>().expect("fresh table");
    for row in rows {
        table.insert(row).expect("fixture keys are unique");
    }
    snapshot
}

/// In-memory store, cache and clock wired together for service tests.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache_store: Arc<InMemoryCacheStore>,
    pub clock: Arc<MutableClock>,
}

impl Harness {
    /// Empty store; the clock reads [`fixed_now`].
    pub fn empty() -> Self {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let cache_store = Arc::new(InMemoryCacheStore::new(clock.clone()));
        Self {
            store: Arc::new(MemoryStore::new()),
            cache_store,
            clock,
        }
    }

    /// Store holding a small helpdesk:
    ///
    /// - students `20201234` (BIS) and `20205678` (FMI), doctors `D01` and
    ///   `D02`, sub-admin `A01`;
    /// - subjects `BIS101`, `BIS102` (level 1) and `FMI201` (level 2, FMI);
    /// - `D01` teaches both BIS subjects, `D02` teaches `FMI201`;
    /// - three tickets: a new one two days old, a high-priority one in
    ///   progress ten days old with one reply, and a closed FMI one forty
    ///   days old.
    pub async fn seeded() -> Self {
        let harness = Self::empty();
        let mut fmi_student = user("20205678", Role::Student);
        fmi_student.program = Some(Program::Fmi);
        let mut doctor_two = user("D02", Role::Doctor);
        doctor_two.program = Some(Program::Fmi);
        harness
            .store
            .seed([
                user("20201234", Role::Student),
                fmi_student,
                user("D01", Role::Doctor),
                doctor_two,
                user("A01", Role::SubAdmin),
            ])
            .await
            .expect("seed users");

        let mut fmi_subject = subject("FMI201", 2);
        fmi_subject.program = Program::Fmi;
        harness
            .store
            .seed([subject("BIS101", 1), subject("BIS102", 1), fmi_subject])
            .await
            .expect("seed subjects");
        harness
            .store
            .seed([
                DoctorSubject::new("D01", "BIS101"),
                DoctorSubject::new("D01", "BIS102"),
                DoctorSubject::new("D02", "FMI201"),
            ])
            .await
            .expect("seed assignments");

        let now = fixed_now();
        let recent = Ticket {
            created_at: now - Duration::days(2),
            ..ticket("BIS101-D01-1234-1", "20201234", "D01", "BIS101")
        };
        let urgent = Ticket {
            status: TicketStatus::InProgress,
            is_high_priority: true,
            created_at: now - Duration::days(10),
            ..ticket("BIS102-D01-1234-1", "20201234", "D01", "BIS102")
        };
        let closed = Ticket {
            status: TicketStatus::Closed,
            program: Program::Fmi,
            level: 2,
            created_at: now - Duration::days(40),
            ..ticket("FMI201-D02-5678-1", "20205678", "D02", "FMI201")
        };
        harness
            .store
            .seed([recent, urgent, closed])
            .await
            .expect("seed tickets");
        harness
            .store
            .seed([message("BIS102-D01-1234-1", "D01", "Looking into it")])
            .await
            .expect("seed messages");
        harness
    }

    pub fn sessions(&self) -> UnitOfWorkFactory {
        UnitOfWorkFactory::new(self.store.clone(), CommitPolicy::default())
    }

    pub fn cache(&self) -> ResultCache {
        ResultCache::new(self.cache_store.clone(), CacheTtls::default())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
