//! Pure domain logic for the dashboard hub: error kinds, shared types,
//! field rules, and the dashboard access decision. No I/O lives here.

pub mod access;
pub mod error;
pub mod rules;
pub mod types;
