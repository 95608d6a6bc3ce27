//! Course subjects and doctor assignments.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::user::{Program, User};

/// Course a ticket is raised against, e.g. `BIS101`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Course code.
    pub id: String,
    /// Course title.
    pub name: String,
    /// Study year the course belongs to.
    pub level: u8,
    /// Term within the year.
    pub term: u8,
    /// Owning program.
    pub program: Program,
}

impl Entity for Subject {
    type Key = String;
    const KIND: &'static str = "subjects";

    fn key(&self) -> Self::Key {
        self.id.clone()
    }
}

/// Assignment of a doctor to a subject.
///
/// Keyed by `(doctor_id, subject_id)`, so a doctor holds each subject at
/// most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSubject {
    /// Assigned doctor.
    pub doctor_id: String,
    /// Assigned subject.
    pub subject_id: String,
    /// Eagerly loaded doctor.
    #[serde(skip)]
    pub doctor: Option<User>,
    /// Eagerly loaded subject.
    #[serde(skip)]
    pub subject: Option<Subject>,
}

impl DoctorSubject {
    /// Unloaded assignment row.
    pub fn new(doctor_id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            subject_id: subject_id.into(),
            doctor: None,
            subject: None,
        }
    }
}

impl Entity for DoctorSubject {
    type Key = (String, String);
    const KIND: &'static str = "doctor_subjects";

    fn key(&self) -> Self::Key {
        (self.doctor_id.clone(), self.subject_id.clone())
    }

    fn detach(&mut self) {
        self.doctor = None;
        self.subject = None;
    }
}
