use tracing::info;

use infra::db::{is_unique_violation, Db};
use infra::repos::rooms::{self, CreateRoom, RoomScope, UpdateRoom, ACTIVE_NAME_KEY};

use crate::error::AppError;
use crate::types::Room;

pub const MIN_NAME_LEN: usize = 3;

/// Fields an admin may change on a room. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

/// Trim and check a room name.
pub fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(AppError::validation(format!(
            "room name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_capacity(capacity: i32) -> Result<i32, AppError> {
    if capacity < 1 {
        return Err(AppError::validation("room capacity must be at least 1"));
    }
    Ok(capacity)
}

fn translate_name_conflict(err: sqlx::Error, name: &str) -> AppError {
    if is_unique_violation(&err, ACTIVE_NAME_KEY) {
        AppError::DuplicateName(name.to_string())
    } else {
        AppError::Db(err)
    }
}

/// Room roster: identity, capacity and soft-delete state.
#[derive(Clone)]
pub struct RoomDirectory {
    db: Db,
}

impl RoomDirectory {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, name: &str, capacity: i32) -> Result<Room, AppError> {
        let name = validate_name(name)?;
        let capacity = validate_capacity(capacity)?;

        if rooms::active_name_exists(&self.db, &name, None).await? {
            return Err(AppError::DuplicateName(name));
        }

        let row = rooms::create(
            &self.db,
            CreateRoom {
                name: name.clone(),
                capacity,
            },
        )
        .await
        .map_err(|e| translate_name_conflict(e, &name))?;

        info!("Created room {} ({})", row.id, row.name);
        Ok(row.into())
    }

    /// Apply a partial update. Only the supplied fields are validated.
    pub async fn update(&self, id: i32, patch: RoomPatch) -> Result<Room, AppError> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let capacity = patch.capacity.map(validate_capacity).transpose()?;

        if let Some(name) = &name {
            if rooms::active_name_exists(&self.db, name, Some(id)).await? {
                return Err(AppError::DuplicateName(name.clone()));
            }
        }

        let row = rooms::update(
            &self.db,
            id,
            UpdateRoom {
                name: name.clone(),
                capacity,
            },
        )
        .await
        .map_err(|e| translate_name_conflict(e, name.as_deref().unwrap_or_default()))?
        .ok_or(AppError::RoomNotFound(id))?;

        info!("Updated room {}", row.id);
        Ok(row.into())
    }

    pub async fn soft_delete(&self, id: i32) -> Result<Room, AppError> {
        let row = rooms::soft_delete(&self.db, id)
            .await?
            .ok_or(AppError::RoomNotFound(id))?;

        info!("Soft-deleted room {}", row.id);
        Ok(row.into())
    }

    /// Bring a soft-deleted room back. Fails with `DuplicateName` when an
    /// active room took its name in the meantime.
    pub async fn restore(&self, id: i32) -> Result<Room, AppError> {
        let existing = rooms::get_by_id(&self.db, id, RoomScope::All)
            .await?
            .ok_or(AppError::RoomNotFound(id))?;

        if existing.deleted_at.is_some()
            && rooms::active_name_exists(&self.db, &existing.name, Some(id)).await?
        {
            return Err(AppError::DuplicateName(existing.name));
        }

        let row = rooms::restore(&self.db, id)
            .await
            .map_err(|e| translate_name_conflict(e, &existing.name))?
            .ok_or(AppError::RoomNotFound(id))?;

        info!("Restored room {}", row.id);
        Ok(row.into())
    }

    /// An active room by id.
    pub async fn get(&self, id: i32) -> Result<Room, AppError> {
        rooms::get_by_id(&self.db, id, RoomScope::Active)
            .await?
            .map(Room::from)
            .ok_or(AppError::RoomNotFound(id))
    }

    pub async fn find_active(&self) -> Result<Vec<Room>, AppError> {
        self.list(RoomScope::Active).await
    }

    /// Every room, soft-deleted ones included.
    pub async fn find_all(&self) -> Result<Vec<Room>, AppError> {
        self.list(RoomScope::All).await
    }

    /// Active rooms matching `ids`; an empty list means every active room.
    pub async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<Room>, AppError> {
        Ok(rooms::list_active_by_ids(&self.db, ids)
            .await?
            .into_iter()
            .map(Room::from)
            .collect())
    }

    async fn list(&self, scope: RoomScope) -> Result<Vec<Room>, AppError> {
        Ok(rooms::list(&self.db, scope)
            .await?
            .into_iter()
            .map(Room::from)
            .collect())
    }
}
