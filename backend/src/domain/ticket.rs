//! Tickets and the messages exchanged on them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, KeyStrategy};
use super::subject::Subject;
use super::user::{Program, User};

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Raised, not yet picked up.
    New,
    /// A doctor is working on it.
    InProgress,
    /// Resolved.
    Closed,
}

impl TicketStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::New, Self::InProgress, Self::Closed];

    /// Canonical status name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "InProgress",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question raised by a student for a doctor about one subject.
///
/// The identifier is derived from its participants; see
/// [`crate::domain::ticket_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// `"{subject}-{doctor}-{last4(student)}-{n}"`.
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Full question.
    pub body: String,
    /// Lecture group of the student.
    pub group_number: u16,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Flag raised by administrators.
    pub is_high_priority: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Program of the ticket's subject.
    pub program: Program,
    /// Author.
    pub student_id: String,
    /// Addressee.
    pub doctor_id: String,
    /// Subject raised against.
    pub subject_id: String,
    /// Study year.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
    /// Eagerly loaded author.
    pub student: Option<User>,
    /// Eagerly loaded addressee.
    pub doctor: Option<User>,
    /// Eagerly loaded subject.
    pub subject: Option<Subject>,
    /// Eagerly loaded messages, oldest first.
    pub messages: Vec<Message>,
}

impl Entity for Ticket {
    type Key = String;
    const KIND: &'static str = "tickets";

    fn key(&self) -> Self::Key {
        self.id.clone()
    }

    fn detach(&mut self) {
        self.student = None;
        self.doctor = None;
        self.subject = None;
        self.messages.clear();
    }
}

/// Reply posted on a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned sequence; zero until committed.
    pub id: i64,
    /// Reply text.
    pub body: String,
    /// Posting instant.
    pub sent_at: DateTime<Utc>,
    /// Set for replies from administrators.
    pub is_high_priority: bool,
    /// Ticket replied to.
    pub ticket_id: String,
    /// Author.
    pub sender_id: String,
    /// Eagerly loaded author.
    pub sender: Option<User>,
}

impl Entity for Message {
    type Key = i64;
    const KIND: &'static str = "messages";
    const KEY_STRATEGY: KeyStrategy = KeyStrategy::Generated;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn assign_generated_key(&mut self, sequence: u64) {
        self.id = i64::try_from(sequence).unwrap_or(i64::MAX);
    }

    fn detach(&mut self) {
        self.sender = None;
    }
}
