//! Transfer objects returned by the services.
//!
//! These are plain serialisable shapes; adapters decide how to put them on
//! the wire. Names of loaded relations default to an empty string when the
//! relation was not loaded or no longer exists.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Error, Message, Program, Role, Subject, Ticket, TicketStatus, User};

fn name_of(user: Option<&User>) -> String {
    user.map(|u| u.name.clone()).unwrap_or_default()
}

/// Reply as shown on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Store-assigned id.
    pub id: i64,
    /// Reply text.
    pub body: String,
    /// Posting instant.
    pub sent_at: DateTime<Utc>,
    /// Set for administrator replies.
    pub is_high_priority: bool,
    /// Author id.
    pub sender_id: String,
    /// Author display name.
    pub sender_name: String,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            sender_name: name_of(message.sender.as_ref()),
            id: message.id,
            body: message.body,
            sent_at: message.sent_at,
            is_high_priority: message.is_high_priority,
            sender_id: message.sender_id,
        }
    }
}

/// Ticket with participant names and its conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    /// Ticket identifier.
    pub id: String,
    /// Short summary.
    pub title: String,
    /// Full question.
    pub body: String,
    /// Study year.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
    /// Lecture group.
    pub group_number: u16,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// Administrator flag.
    pub is_high_priority: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Program of the subject.
    pub program: Program,
    /// Author id.
    pub student_id: String,
    /// Author display name.
    pub student_name: String,
    /// Addressee id.
    pub doctor_id: String,
    /// Addressee display name.
    pub doctor_name: String,
    /// Subject code.
    pub subject_id: String,
    /// Subject title.
    pub subject_name: String,
    /// Conversation, oldest first.
    pub messages: Vec<MessageDto>,
}

impl From<Ticket> for TicketDto {
    fn from(ticket: Ticket) -> Self {
        Self {
            student_name: name_of(ticket.student.as_ref()),
            doctor_name: name_of(ticket.doctor.as_ref()),
            subject_name: ticket.subject.map(|s| s.name).unwrap_or_default(),
            messages: ticket.messages.into_iter().map(MessageDto::from).collect(),
            id: ticket.id,
            title: ticket.title,
            body: ticket.body,
            level: ticket.level,
            term: ticket.term,
            group_number: ticket.group_number,
            status: ticket.status,
            is_high_priority: ticket.is_high_priority,
            created_at: ticket.created_at,
            program: ticket.program,
            student_id: ticket.student_id,
            doctor_id: ticket.doctor_id,
            subject_id: ticket.subject_id,
        }
    }
}

/// New ticket submitted by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// Short summary.
    pub title: String,
    /// Full question.
    pub body: String,
    /// Lecture group.
    pub group_number: u16,
    /// Subject raised against.
    pub subject_id: String,
    /// Addressed doctor.
    pub doctor_id: String,
    /// Study year.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
}

/// Reply to an existing ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// Ticket replied to.
    pub ticket_id: String,
    /// Reply text.
    pub body: String,
}

/// Id and name pair for pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookup {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Account as listed to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Identifier.
    pub id: String,
    /// Login name.
    pub user_name: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: Role,
    /// Owning program.
    pub program: Option<Program>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            name: user.name,
            role: user.role,
            program: user.program,
        }
    }
}

/// Account to create. Credentials are provisioned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Identifier, also used as the login name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: Role,
    /// Owning program.
    pub program: Option<Program>,
}

/// Replacement subject list for a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSubjectsRequest {
    /// Doctor whose assignments are replaced.
    pub doctor_id: String,
    /// Complete new subject list.
    pub subject_ids: Vec<String>,
}

/// Subject as listed in catalogues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDto {
    /// Course code.
    pub id: String,
    /// Course title.
    pub name: String,
    /// Study year.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
    /// Owning program.
    pub program: Program,
}

impl From<Subject> for SubjectDto {
    fn from(subject: Subject) -> Self {
        Self {
            id: subject.id,
            name: subject.name,
            level: subject.level,
            term: subject.term,
            program: subject.program,
        }
    }
}

/// Ticket counts of one doctor by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorStats {
    /// Tickets in [`TicketStatus::New`].
    pub new_tickets: usize,
    /// Tickets in [`TicketStatus::InProgress`].
    pub in_progress_tickets: usize,
    /// Tickets in [`TicketStatus::Closed`].
    pub closed_tickets: usize,
    /// Sum of the above.
    pub total_tickets: usize,
}

/// One of a doctor's subjects with its ticket total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSubjectDetail {
    /// Course code.
    pub subject_id: String,
    /// Course title.
    pub subject_name: String,
    /// Study year.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
    /// Tickets addressed to the doctor for this subject.
    pub total_tickets: usize,
}

/// Doctor ranked by ticket volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorTicketCount {
    /// Doctor id.
    pub doctor_id: String,
    /// Doctor display name.
    pub doctor_name: String,
    /// All tickets.
    pub ticket_count: usize,
    /// Tickets still new.
    pub new_count: usize,
    /// Tickets in progress.
    pub in_progress_count: usize,
    /// Closed tickets.
    pub closed_count: usize,
}

/// Subject ranked by ticket volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectTicketCount {
    /// Course code.
    pub subject_id: String,
    /// Course title.
    pub subject_name: String,
    /// Study year.
    pub level: u8,
    /// All tickets.
    pub ticket_count: usize,
}

/// System-wide dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    /// Ticket count per `"Level {n}"`.
    pub tickets_by_level: BTreeMap<String, usize>,
    /// Ticket count per status name.
    pub tickets_by_status: BTreeMap<String, usize>,
    /// Busiest doctors.
    pub top_doctors_by_tickets: Vec<DoctorTicketCount>,
    /// Busiest subjects.
    pub top_subjects_by_tickets: Vec<SubjectTicketCount>,
    /// All tickets.
    pub total_tickets: usize,
    /// All users.
    pub total_users: usize,
    /// Users in the doctor role.
    pub total_doctors: usize,
    /// Users in the student role.
    pub total_students: usize,
}

/// Relative reporting window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since midnight UTC.
    Today,
    /// The last seven days.
    Week,
    /// The last thirty days.
    Month,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::invalid_request(format!(
                "unknown period `{other}`; expected today, week or month"
            ))),
        }
    }
}

/// Filters for [`TicketCounts`]. Every field is optional and they combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketCountsQuery {
    /// Program scope.
    pub program: Option<Program>,
    /// Study year.
    pub level: Option<u8>,
    /// Relative window; combined with `from`/`to` when both are set.
    pub period: Option<Period>,
    /// Subject.
    pub subject_id: Option<String>,
    /// Doctor.
    pub doctor_id: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub to: Option<DateTime<Utc>>,
}

/// Ticket totals under a [`TicketCountsQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCounts {
    /// All matching tickets.
    pub total_tickets: usize,
    /// New.
    pub new_tickets: usize,
    /// In progress.
    pub in_progress_tickets: usize,
    /// Closed.
    pub closed_tickets: usize,
    /// With at least one message.
    pub replied_tickets: usize,
    /// Without any message.
    pub unreplied_tickets: usize,
    /// Flagged high priority.
    pub high_priority_tickets: usize,
}
