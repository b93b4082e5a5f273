/// HTTP middleware
///
/// - `auth`: bearer-token verification for admin routes

pub mod auth;
