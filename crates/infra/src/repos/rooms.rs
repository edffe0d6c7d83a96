use crate::models::RoomRow;
use sqlx::{PgExecutor, Result as SqlxResult};

/// Name of the partial unique index that keeps active room names distinct.
pub const ACTIVE_NAME_KEY: &str = "rooms_active_name_key";

/// Which rooms a query may see. Every room query filters on this explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomScope {
    /// Rooms that are not soft-deleted.
    Active,
    /// Every room, soft-deleted ones included (admin listings).
    All,
}

impl RoomScope {
    fn include_deleted(self) -> bool {
        matches!(self, RoomScope::All)
    }
}

#[derive(Debug, Clone)]
pub struct CreateRoom {
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRoom {
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateRoom) -> SqlxResult<RoomRow> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        INSERT INTO rooms (name, capacity)
        VALUES ($1, $2)
        RETURNING id, name, capacity, created_at, updated_at, deleted_at
        "#,
    )
    .bind(data.name)
    .bind(data.capacity)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: i32,
    scope: RoomScope,
) -> SqlxResult<Option<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        SELECT id, name, capacity, created_at, updated_at, deleted_at
        FROM rooms
        WHERE id = $1 AND ($2 OR deleted_at IS NULL)
        "#,
    )
    .bind(id)
    .bind(scope.include_deleted())
    .fetch_optional(executor)
    .await
}

pub async fn list<'e>(executor: impl PgExecutor<'e>, scope: RoomScope) -> SqlxResult<Vec<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        SELECT id, name, capacity, created_at, updated_at, deleted_at
        FROM rooms
        WHERE $1 OR deleted_at IS NULL
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(scope.include_deleted())
    .fetch_all(executor)
    .await
}

/// Active rooms with the given ids. An empty id list selects every active room.
pub async fn list_active_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[i32],
) -> SqlxResult<Vec<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        SELECT id, name, capacity, created_at, updated_at, deleted_at
        FROM rooms
        WHERE deleted_at IS NULL
          AND (cardinality($1::int4[]) = 0 OR id = ANY($1))
        ORDER BY name ASC, id ASC
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Whether an active room other than `exclude_id` already uses `name`.
pub async fn active_name_exists<'e>(
    executor: impl PgExecutor<'e>,
    name: &str,
    exclude_id: Option<i32>,
) -> SqlxResult<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM rooms
            WHERE name = $1
              AND deleted_at IS NULL
              AND ($2::int4 IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(executor)
    .await
}

pub async fn update<'e>(
    executor: impl PgExecutor<'e>,
    id: i32,
    data: UpdateRoom,
) -> SqlxResult<Option<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        UPDATE rooms
        SET name = COALESCE($2, name),
            capacity = COALESCE($3, capacity),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, capacity, created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .bind(data.name)
    .bind(data.capacity)
    .fetch_optional(executor)
    .await
}

/// Mark a room deleted. Deleting an already-deleted room keeps its original
/// `deleted_at`.
pub async fn soft_delete<'e>(executor: impl PgExecutor<'e>, id: i32) -> SqlxResult<Option<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        UPDATE rooms
        SET deleted_at = COALESCE(deleted_at, NOW()),
            updated_at = CASE WHEN deleted_at IS NULL THEN NOW() ELSE updated_at END
        WHERE id = $1
        RETURNING id, name, capacity, created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn restore<'e>(executor: impl PgExecutor<'e>, id: i32) -> SqlxResult<Option<RoomRow>> {
    sqlx::query_as::<_, RoomRow>(
        r#"
        UPDATE rooms
        SET deleted_at = NULL,
            updated_at = CASE WHEN deleted_at IS NULL THEN updated_at ELSE NOW() END
        WHERE id = $1
        RETURNING id, name, capacity, created_at, updated_at, deleted_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
