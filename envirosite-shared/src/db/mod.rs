/// Database layer
///
/// - `pool`: PostgreSQL connection pool and health checks
/// - `migrations`: Embedded SQL migrations from the workspace `migrations/` directory
///
/// Models and their queries live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
