//! User, subject, and assignment specifications.

use pagination::PageRequest;

use super::includes::{assignment_doctor, assignment_subject};
use crate::domain::specification::{Specification, SpecificationError};
use crate::domain::{DoctorSubject, Program, Subject, User};

/// Users matching `search` (case-insensitive substring of id, user name or
/// display name) within `program`, ordered by id.
///
/// A blank search matches every user.
pub fn user_search(
    search: Option<&str>,
    program: Option<Program>,
    page: Option<PageRequest>,
) -> Result<Specification<User>, SpecificationError> {
    let needle = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);
    let mut builder = Specification::builder().order_by(|u: &User| u.id.clone());
    if let Some(needle) = needle {
        builder = builder.with_criteria(move |u: &User| {
            [&u.id, &u.user_name, &u.name]
                .into_iter()
                .any(|field| field.to_lowercase().contains(needle.as_str()))
        });
    }
    if let Some(program) = program {
        builder = builder.with_criteria(move |u: &User| u.program == Some(program));
    }
    if let Some(page) = page {
        builder = builder.apply_page(page);
    }
    builder.build()
}

/// Subjects taught in one level and term, ordered by id.
pub fn subjects_by_level_and_term(
    level: u8,
    term: u8,
) -> Result<Specification<Subject>, SpecificationError> {
    Specification::builder()
        .with_criteria(move |s: &Subject| s.level == level && s.term == term)
        .order_by(|s| s.id.clone())
        .build()
}

/// Subject catalogue, optionally within one program, ordered by id.
pub fn subjects_in_program(
    program: Option<Program>,
) -> Result<Specification<Subject>, SpecificationError> {
    Specification::builder()
        .with_criteria(move |s: &Subject| program.is_none_or(|program| s.program == program))
        .order_by(|s| s.id.clone())
        .build()
}

/// Assignments of one doctor with their subjects loaded.
pub fn doctor_subjects_of(doctor_id: &str) -> Result<Specification<DoctorSubject>, SpecificationError> {
    let doctor_id = doctor_id.to_owned();
    Specification::builder()
        .with_criteria(move |a: &DoctorSubject| a.doctor_id == doctor_id)
        .add_include(assignment_subject())
        .build()
}

/// Assignments for one subject with their doctors loaded.
pub fn doctors_for_subject(
    subject_id: &str,
) -> Result<Specification<DoctorSubject>, SpecificationError> {
    let subject_id = subject_id.to_owned();
    Specification::builder()
        .with_criteria(move |a: &DoctorSubject| a.subject_id == subject_id)
        .add_include(assignment_doctor())
        .build()
}
