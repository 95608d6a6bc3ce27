//! Domain model, data-access primitives, and services.
//!
//! Purpose: define the helpdesk entities, the specification and repository
//! machinery used to query them, and the services that compose both into
//! ticketing workflows. Outbound adapters implement the ports in
//! [`ports`].
//!
//! Public surface:
//! - Entities: [`User`], [`Subject`], [`DoctorSubject`], [`Ticket`],
//!   [`Message`].
//! - Data access: [`Specification`], [`Repository`], [`UnitOfWork`],
//!   [`UnitOfWorkFactory`].
//! - Caching: [`ResultCache`] and its [`cache::keys`].
//! - Services: [`TicketService`], [`AdminService`], [`DoctorService`],
//!   [`AnalyticsService`].
//! - Errors: [`Error`] with a stable [`ErrorCode`].

pub mod cache;
pub mod dto;
pub mod entity;
pub mod error;
pub mod ports;
pub mod repository;
pub mod specification;
pub mod specs;
pub mod subject;
pub mod ticket;
pub mod ticket_id;
pub mod unit_of_work;
pub mod user;

mod admin_service;
mod analytics_service;
mod doctor_service;
mod service_support;
mod ticket_service;

#[cfg(test)]
pub mod test_fixtures;

pub use self::admin_service::AdminService;
pub use self::analytics_service::{AnalyticsService, TOP_RANKING_SIZE};
pub use self::cache::{CacheTtls, ResultCache};
pub use self::doctor_service::DoctorService;
pub use self::entity::{Entity, KeyStrategy};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::repository::Repository;
pub use self::specification::{Specification, SpecificationBuilder, SpecificationError};
pub use self::subject::{DoctorSubject, Subject};
pub use self::ticket::{Message, Ticket, TicketStatus};
pub use self::ticket_id::TicketSequenceLocks;
pub use self::ticket_service::TicketService;
pub use self::unit_of_work::{CommitPolicy, UnitOfWork, UnitOfWorkFactory};
pub use self::user::{ParseCodeError, Program, Role, User};
