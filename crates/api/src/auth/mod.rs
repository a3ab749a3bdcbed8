//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access/reset token generation, validation, and reset-token digests.

pub mod jwt;
pub mod password;
