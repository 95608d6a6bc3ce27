//! Helpdesk accounts and their roles.
//!
//! Identity storage, password hashing and login live outside this crate;
//! users here are the rows the ticketing workflows join against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::Entity;

/// Role a user acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Opens tickets.
    Student,
    /// Answers tickets for assigned subjects.
    Doctor,
    /// Administers one program.
    SubAdmin,
    /// Administers every program.
    SuperAdmin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 4] = [Self::Student, Self::Doctor, Self::SubAdmin, Self::SuperAdmin];

    /// Canonical role name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Doctor => "Doctor",
            Self::SubAdmin => "SubAdmin",
            Self::SuperAdmin => "SuperAdmin",
        }
    }

    /// Whether replies sent under this role are flagged high priority.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SubAdmin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Academic program a user, subject, or ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Program {
    /// Business information systems.
    Bis,
    /// Financial and management informatics.
    Fmi,
    /// Computer science.
    Cs,
}

impl Program {
    /// Every program, in declaration order.
    pub const ALL: [Self; 3] = [Self::Bis, Self::Fmi, Self::Cs];

    /// Canonical upper-case program code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bis => "BIS",
            Self::Fmi => "FMI",
            Self::Cs => "CS",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unknown role or program code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseCodeError {
    kind: &'static str,
    value: String,
}

impl FromStr for Role {
    type Err = ParseCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseCodeError {
                kind: "role",
                value: value.to_owned(),
            })
    }
}

impl FromStr for Program {
    type Err = ParseCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|program| program.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseCodeError {
                kind: "program",
                value: value.to_owned(),
            })
    }
}

/// Helpdesk account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier, e.g. a student number.
    pub id: String,
    /// Login name.
    pub user_name: String,
    /// Display name.
    pub name: String,
    /// Role the account acts under.
    pub role: Role,
    /// Owning program; `None` for super administrators.
    pub program: Option<Program>,
}

impl Entity for User {
    type Key = String;
    const KIND: &'static str = "users";

    fn key(&self) -> Self::Key {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    //! Code parsing coverage.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bis", Program::Bis)]
    #[case(" FMI ", Program::Fmi)]
    #[case("Cs", Program::Cs)]
    fn programs_parse_case_insensitively(#[case] raw: &str, #[case] expected: Program) {
        assert_eq!(raw.parse::<Program>(), Ok(expected));
    }

    #[rstest]
    fn unknown_codes_are_rejected() {
        let err = "MED".parse::<Program>().expect_err("unknown program");
        assert_eq!(err.to_string(), "unknown program `MED`");
        assert!("Janitor".parse::<Role>().is_err());
    }

    #[rstest]
    #[case(Role::Student, false)]
    #[case(Role::Doctor, false)]
    #[case(Role::SubAdmin, true)]
    #[case(Role::SuperAdmin, true)]
    fn admin_roles(#[case] role: Role, #[case] expected: bool) {
        assert_eq!(role.is_admin(), expected);
    }

    #[rstest]
    fn programs_serialise_as_codes() {
        let value = serde_json::to_value(Program::Bis).expect("serialise program");
        assert_eq!(value, "BIS");
    }
}
