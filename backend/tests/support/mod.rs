//! Shared helpers for helpdesk integration tests.
//!
//! Integration tests compile as separate crates, so the seeded helpdesk
//! lives here rather than in the library's unit-test fixtures.

pub mod seed_helpers;
