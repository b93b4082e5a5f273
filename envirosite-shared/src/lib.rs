//! # Envirosite Shared Library
//!
//! Types, queries and utilities used by the Envirosite API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `listing`: Search, sort and pagination options for list endpoints
//! - `auth`: Password hashing and JWT tokens
//! - `db`: Connection pool and migrations
//! - `mail`: Outgoing mail delivery

pub mod auth;
pub mod db;
pub mod listing;
pub mod mail;
pub mod models;
pub mod validation;

/// Current version of the Envirosite shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
