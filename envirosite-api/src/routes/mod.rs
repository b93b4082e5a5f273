/// API route handlers, one module per resource
///
/// - `health`: Health check
/// - `auth`: Register, login, current admin, profile
/// - `admins`: Admin account management
/// - `services`: Consulting services
/// - `projects`: Portfolio projects and their services
/// - `team_members`: Team members and display order
/// - `contact`: Public contact form
/// - `uploads`: Image upload configuration

pub mod admins;
pub mod auth;
pub mod contact;
pub mod health;
pub mod projects;
pub mod services;
pub mod team_members;
pub mod uploads;
