/// Admin user model and database operations
///
/// Every user is an administrator of the back-office. Passwords are stored as
/// Argon2id hashes and never serialized.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     full_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,       -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use envirosite_shared::models::user::{User, CreateUser};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     full_name: "Ada Green".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "ADA@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use crate::listing::{push_order_and_page, push_search, ListQuery, Page, SortOrder, SortSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, full_name, email, password_hash, created_at, updated_at";

/// Sortable columns for the admin list
pub const USER_SORT: SortSpec = SortSpec {
    allowed: &[
        ("id", "id"),
        ("fullName", "full_name"),
        ("email", "email"),
        ("createdAt", "created_at"),
    ],
    default_column: "created_at",
    default_order: SortOrder::Desc,
};

/// Admin user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,

    pub full_name: String,

    /// Unique, compared case-insensitively
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub full_name: String,
    pub email: String,
    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a database error on a duplicate email (`users_email_key`)
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (full_name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            COLUMNS
        ))
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether `email` belongs to a user other than `exclude_id`
    pub async fn email_taken(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Updates an existing user
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Some(full_name) = data.full_name {
            qb.push(", full_name = ").push_bind(full_name);
        }
        if let Some(email) = data.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            qb.push(", password_hash = ").push_bind(password_hash);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(COLUMNS);

        let user = qb.build_query_as::<User>().fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users matching the search term (full name or email)
    pub async fn list(pool: &PgPool, query: &ListQuery) -> Result<Page<Self>, sqlx::Error> {
        let pagination = query.pagination();
        let pattern = query.search_pattern();
        let (column, order) = query.order_by(&USER_SORT);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", COLUMNS));

        if let Some(pattern) = &pattern {
            for qb in [&mut count, &mut select] {
                qb.push(" WHERE ");
                push_search(qb, &["full_name", "email"], pattern);
            }
        }

        push_order_and_page(&mut select, column, order, pagination);

        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;
        let items = select.build_query_as::<User>().fetch_all(pool).await?;

        Ok(Page {
            items,
            meta: pagination.meta(total),
        })
    }

    /// Returns every user, oldest first
    pub async fn all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", COLUMNS))
            .fetch_all(pool)
            .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.full_name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            full_name: "Ada Green".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2id"));
        assert_eq!(json["fullName"], "Ada Green");
    }

    // Database-backed tests live in envirosite-api/tests/
}
