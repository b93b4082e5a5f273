/// Database models for Envirosite
///
/// Each model owns its SQL. Functions that take `&PgPool` run standalone;
/// functions that take `&mut PgConnection` are meant to be called on an open
/// transaction (`&mut tx`).
///
/// # Models
///
/// - `user`: Admin accounts
/// - `service`: Consulting services
/// - `project`: Portfolio projects
/// - `project_service`: Project ↔ Service join rows
/// - `team_member`: Team members and their display order

pub mod project;
pub mod project_service;
pub mod service;
pub mod team_member;
pub mod user;
