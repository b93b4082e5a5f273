/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
/// - `STATIC_DIR`: optional directory with the built front-end
/// - `DATABASE_URL`: full connection URL, or the parts `DB_HOST`, `DB_PORT`,
///   `DB_USER`, `DB_PASS`, `DB_NAME`
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `RUN_MIGRATIONS`: apply migrations on startup (default true)
/// - `JWT_SECRET`: token signing secret (required, at least 32 characters)
/// - `JWT_EXPIRES_IN_HOURS`: token lifetime (default 24)
/// - `ALLOW_REGISTRATION`: enable `POST /api/auth/register` (default true)
/// - `MAIL_HOST`, `MAIL_PORT`, `MAIL_USER`, `MAIL_PASS`, `MAIL_SECURE`,
///   `MAIL_FROM`, `MAIL_FROM_NAME`: SMTP delivery
/// - `UPLOAD_ENDPOINT_URL`, `UPLOAD_TIMEOUT_MS`: external image upload service
///
/// # Example
///
/// ```no_run
/// use envirosite_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use envirosite_shared::db::pool::DatabaseConfig;
use envirosite_shared::mail::MailConfig;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub upload: UploadConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Built front-end served for non-API paths
    pub static_dir: Option<PathBuf>,

    /// Whether `POST /api/auth/register` is open
    pub allow_registration: bool,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in hours
    pub expires_in_hours: i64,
}

/// External image upload service, used by the browser upload flow
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub endpoint_url: Option<String>,
    pub timeout_ms: u64,
}

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    /// Builds configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let api = ApiConfig {
            host: get("API_HOST").unwrap_or("0.0.0.0").to_string(),
            port: parse_or(vars, "API_PORT", 8080)?,
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or("*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            allow_registration: parse_or(vars, "ALLOW_REGISTRATION", true)?,
            run_migrations: parse_or(vars, "RUN_MIGRATIONS", true)?,
        };

        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: get("DATABASE_URL").map(str::to_string),
            host: get("DB_HOST").map(str::to_string).unwrap_or(defaults.host),
            port: parse_or(vars, "DB_PORT", defaults.port)?,
            username: get("DB_USER").map(str::to_string).unwrap_or(defaults.username),
            password: vars.get("DB_PASS").cloned().unwrap_or_default(),
            database: get("DB_NAME").map(str::to_string).unwrap_or(defaults.database),
            max_connections: parse_or(vars, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            ..defaults
        };

        let secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?
            .to_string();

        if secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let jwt = JwtConfig {
            secret,
            expires_in_hours: parse_or(vars, "JWT_EXPIRES_IN_HOURS", 24)?,
        };

        if jwt.expires_in_hours <= 0 {
            anyhow::bail!("JWT_EXPIRES_IN_HOURS must be positive");
        }

        let mail_defaults = MailConfig::default();
        let mail = MailConfig {
            host: get("MAIL_HOST").map(str::to_string),
            port: parse_or(vars, "MAIL_PORT", mail_defaults.port)?,
            username: get("MAIL_USER").map(str::to_string),
            password: vars.get("MAIL_PASS").cloned(),
            secure: parse_or(vars, "MAIL_SECURE", mail_defaults.secure)?,
            from_address: get("MAIL_FROM")
                .map(str::to_string)
                .unwrap_or(mail_defaults.from_address),
            from_name: get("MAIL_FROM_NAME")
                .map(str::to_string)
                .unwrap_or(mail_defaults.from_name),
        };

        let upload = UploadConfig {
            endpoint_url: get("UPLOAD_ENDPOINT_URL").map(str::to_string),
            timeout_ms: parse_or(vars, "UPLOAD_TIMEOUT_MS", 30_000)?,
        };

        Ok(Self {
            api,
            database,
            jwt,
            mail,
            upload,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Token lifetime as a duration
    pub fn token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expires_in_hours)
    }
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}
