/// Team member model
///
/// Team members are rendered on the public site in `display_order`. The
/// orders form a dense `0..n-1` sequence: new members go to the end unless
/// placed explicitly, a placed member shifts the others, and deletes close
/// the gap. Every write that touches the order locks the table for the rest
/// of its transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE team_members (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     position VARCHAR(255) NOT NULL,
///     image TEXT,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     display_order INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::listing::{push_order_and_page, push_search, ListQuery, Page, SortOrder, SortSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

const COLUMNS: &str = "id, name, position, image, is_active, display_order, created_at, updated_at";

/// Sortable columns for the team list
pub const TEAM_MEMBER_SORT: SortSpec = SortSpec {
    allowed: &[
        ("id", "id"),
        ("name", "name"),
        ("position", "position"),
        ("displayOrder", "display_order"),
        ("isActive", "is_active"),
        ("createdAt", "created_at"),
    ],
    default_column: "display_order",
    default_order: SortOrder::Asc,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a team member
#[derive(Debug, Clone)]
pub struct CreateTeamMember {
    pub name: String,
    pub position: String,
    pub image: Option<String>,
    pub is_active: bool,
    /// `None` appends the member after the current last one
    pub display_order: Option<i32>,
}

/// Field changes for update/patch; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct TeamMemberChanges {
    pub name: Option<String>,
    pub position: Option<String>,
    /// `Some(None)` clears the image
    pub image: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

impl TeamMemberChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.position.is_none()
            && self.image.is_none()
            && self.is_active.is_none()
            && self.display_order.is_none()
    }
}

/// Optional filters for the team list
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamMemberFilter {
    pub is_active: Option<bool>,
}

/// One `{id, displayOrder}` pair of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAssignment {
    pub id: i32,
    pub display_order: i32,
}

impl TeamMember {
    /// Inserts a member at the end of the order, then moves it to
    /// `display_order` when one was given
    pub async fn create(conn: &mut PgConnection, data: CreateTeamMember) -> Result<Self, sqlx::Error> {
        Self::lock_order(&mut *conn).await?;

        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            INSERT INTO team_members (name, position, image, is_active, display_order)
            VALUES ($1, $2, $3, $4,
                    (SELECT COALESCE(MAX(display_order), -1) + 1 FROM team_members))
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(data.name)
        .bind(data.position)
        .bind(data.image)
        .bind(data.is_active)
        .fetch_one(&mut *conn)
        .await?;

        match data.display_order {
            Some(display_order) => {
                Self::place(&mut *conn, &[OrderAssignment { id: member.id, display_order }]).await?;
                Self::find_in(conn, member.id).await?.ok_or(sqlx::Error::RowNotFound)
            }
            None => Ok(member),
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::find_in(&mut conn, id).await
    }

    async fn find_in(conn: &mut PgConnection, id: i32) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {} FROM team_members WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    /// Applies field changes; `None` if the member doesn't exist
    ///
    /// A new `display_order` moves the member to that position and shifts the
    /// others, keeping the sequence dense.
    pub async fn update(
        conn: &mut PgConnection,
        id: i32,
        changes: TeamMemberChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        if changes.display_order.is_some() {
            Self::lock_order(&mut *conn).await?;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE team_members SET updated_at = NOW()");

        if let Some(name) = changes.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(position) = changes.position {
            qb.push(", position = ").push_bind(position);
        }
        if let Some(image) = changes.image {
            qb.push(", image = ").push_bind(image);
        }
        if let Some(is_active) = changes.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(COLUMNS);

        let Some(member) = qb.build_query_as::<TeamMember>().fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };

        match changes.display_order {
            Some(display_order) => {
                Self::place(&mut *conn, &[OrderAssignment { id, display_order }]).await?;
                Self::find_in(conn, id).await
            }
            None => Ok(Some(member)),
        }
    }

    /// Deletes a member and closes the gap in the display order
    ///
    /// Returns false (and changes nothing) if the member doesn't exist.
    pub async fn delete_and_renumber(conn: &mut PgConnection, id: i32) -> Result<bool, sqlx::Error> {
        Self::lock_order(&mut *conn).await?;

        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        Self::place(conn, &[]).await?;
        Ok(true)
    }

    /// Returns the ids from `ids` that don't exist
    ///
    /// Takes the order lock first, so the answer holds until the transaction
    /// ends.
    pub async fn missing_ids(conn: &mut PgConnection, ids: &[i32]) -> Result<Vec<i32>, sqlx::Error> {
        Self::lock_order(&mut *conn).await?;

        let found: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM team_members WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Moves each listed member to its `display_order`, then returns the
    /// whole team in its new order
    ///
    /// Members not named in `assignments` keep their relative order and fill
    /// the remaining positions.
    pub async fn reorder(
        conn: &mut PgConnection,
        assignments: &[OrderAssignment],
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::lock_order(&mut *conn).await?;
        Self::place(&mut *conn, assignments).await?;
        Self::all_ordered(conn).await
    }

    /// Every member in display order
    pub async fn all_ordered(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {} FROM team_members ORDER BY display_order, id",
            COLUMNS
        ))
        .fetch_all(conn)
        .await
    }

    /// Serializes writers that change the display order until the
    /// transaction ends; must run inside a transaction
    async fn lock_order(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK TABLE team_members IN SHARE ROW EXCLUSIVE MODE")
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Applies `assignments` to the current order and writes the result back
    /// as `0..n-1`
    ///
    /// Returns the number of rows whose order changed.
    async fn place(conn: &mut PgConnection, assignments: &[OrderAssignment]) -> Result<u64, sqlx::Error> {
        let current: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM team_members ORDER BY display_order, id")
                .fetch_all(&mut *conn)
                .await?;

        let ids = arrange(&current, assignments);

        let result = sqlx::query(
            r#"
            UPDATE team_members t
            SET display_order = (u.ord - 1)::INT, updated_at = NOW()
            FROM UNNEST($1::INT[]) WITH ORDINALITY AS u(id, ord)
            WHERE t.id = u.id AND t.display_order <> u.ord - 1
            "#,
        )
        .bind(&ids)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists members; the search term matches name and position
    pub async fn list(
        pool: &PgPool,
        query: &ListQuery,
        filter: TeamMemberFilter,
    ) -> Result<Page<Self>, sqlx::Error> {
        let pagination = query.pagination();
        let pattern = query.search_pattern();
        let (column, order) = query.order_by(&TEAM_MEMBER_SORT);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM team_members WHERE TRUE");
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM team_members WHERE TRUE",
            COLUMNS
        ));

        for qb in [&mut count, &mut select] {
            if let Some(pattern) = &pattern {
                qb.push(" AND ");
                push_search(qb, &["name", "position"], pattern);
            }
            if let Some(is_active) = filter.is_active {
                qb.push(" AND is_active = ").push_bind(is_active);
            }
        }

        push_order_and_page(&mut select, column, order, pagination);

        let total: i64 = count.build_query_scalar().fetch_one(pool).await?;
        let items = select.build_query_as::<TeamMember>().fetch_all(pool).await?;

        Ok(Page {
            items,
            meta: pagination.meta(total),
        })
    }
}

/// Final id sequence after moving each assigned member to its position
///
/// Assignments are applied in ascending `display_order` (request order on
/// ties) and positions past the end are clamped. Ids missing from `current`
/// are ignored.
fn arrange(current: &[i32], assignments: &[OrderAssignment]) -> Vec<i32> {
    let mut moves: Vec<OrderAssignment> = assignments
        .iter()
        .copied()
        .filter(|a| current.contains(&a.id))
        .collect();
    moves.sort_by_key(|a| a.display_order);

    let mut ids: Vec<i32> = current
        .iter()
        .copied()
        .filter(|id| !moves.iter().any(|a| a.id == *id))
        .collect();

    for assignment in moves {
        let at = usize::try_from(assignment.display_order).unwrap_or(0).min(ids.len());
        ids.insert(at, assignment.id);
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_is_empty() {
        assert!(TeamMemberChanges::default().is_empty());

        let changes = TeamMemberChanges {
            image: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_order_assignment_wire_format() {
        let parsed: OrderAssignment = serde_json::from_str(r#"{"id": 4, "displayOrder": 2}"#).unwrap();
        assert_eq!(parsed, OrderAssignment { id: 4, display_order: 2 });
    }

    fn to(id: i32, display_order: i32) -> OrderAssignment {
        OrderAssignment { id, display_order }
    }

    #[test]
    fn test_arrange_moves_single_member_to_front() {
        assert_eq!(arrange(&[1, 2, 3], &[to(3, 0)]), vec![3, 1, 2]);
    }

    #[test]
    fn test_arrange_moves_member_down() {
        assert_eq!(arrange(&[1, 2, 3], &[to(1, 2)]), vec![2, 3, 1]);
        assert_eq!(arrange(&[1, 2, 3], &[to(1, 40)]), vec![2, 3, 1]);
    }

    #[test]
    fn test_arrange_full_list_follows_requested_order() {
        assert_eq!(
            arrange(&[1, 2, 3], &[to(1, 10), to(2, 0), to(3, 5)]),
            vec![2, 3, 1]
        );
    }

    #[test]
    fn test_arrange_without_assignments_keeps_order() {
        assert_eq!(arrange(&[4, 9, 2], &[]), vec![4, 9, 2]);
        assert_eq!(arrange(&[4, 9], &[to(7, 0), to(9, -3)]), vec![9, 4]);
    }

    #[test]
    fn test_default_sort_is_display_order() {
        let (column, order) = ListQuery::default().order_by(&TEAM_MEMBER_SORT);
        assert_eq!(column, "display_order");
        assert_eq!(order, SortOrder::Asc);
    }
}
