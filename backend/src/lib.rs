//! Helpdesk ticketing data-access layer.
//!
//! Specifications describe what to load, repositories and units of work
//! decide how it is read and committed, and the services in
//! [`domain`] combine both with explicit cache invalidation.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod services;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use config::HelpdeskSettings;
pub use services::HelpdeskServices;
