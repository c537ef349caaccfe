//! User identity and the stores that keep it.
//!
//! ARCHITECTURE
//! ============
//! Identity outlives any single connection or room. The auth route creates
//! or looks up a `User` through a `UserStore`; the websocket route resolves
//! the same record before joining a room. Rooms hold their own copy while
//! the user is connected and write name/color changes back through the
//! store so a reconnect keeps them.
//!
//! Two stores exist: `PgUserStore` (table `sv_user`) when a database is
//! configured, `MemoryUserStore` otherwise and in tests.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::frame::ErrorCode;

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "username")]
    pub name: String,
    #[serde(rename = "chatColor")]
    pub color: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Palette new users pick their chat color from.
const GUEST_COLORS: &[&str] = &[
    "#e57373", "#f06292", "#ba68c8", "#7986cb", "#4fc3f7", "#4db6ac", "#81c784", "#dce775", "#ffb74d", "#a1887f",
];

impl User {
    /// A fresh identity with a generated name and color.
    #[must_use]
    pub fn guest() -> Self {
        let mut rng = rand::rng();
        let id = Uuid::new_v4();
        let color = GUEST_COLORS[rng.random_range(0..GUEST_COLORS.len())];
        let suffix: u16 = rng.random_range(1000..10_000);
        Self { id, name: format!("Guest {suffix}"), color: color.to_owned(), is_admin: false }
    }

    /// Whether this user may mutate room state. Every connected member may.
    #[must_use]
    pub fn can_update_room(&self) -> bool {
        true
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("user already exists: {0}")]
    Conflict(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for UserStoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_USER_NOT_FOUND",
            Self::Conflict(_) => "E_USER_CONFLICT",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Durable home of user records.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<User>, UserStoreError>;
    async fn create(&self, user: &User) -> Result<(), UserStoreError>;
    async fn update(&self, user: &User) -> Result<(), UserStoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), UserStoreError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(UserStoreError::Conflict(user.id));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let Some(existing) = users.get_mut(&user.id) else {
            return Err(UserStoreError::NotFound(user.id));
        };
        existing.clone_from(user);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), UserStoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(UserStoreError::NotFound(id))
    }
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, bool)>(
            "SELECT id, name, color, is_admin FROM sv_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, name, color, is_admin)| User { id, name, color, is_admin }))
    }

    async fn create(&self, user: &User) -> Result<(), UserStoreError> {
        let result = sqlx::query(
            "INSERT INTO sv_user (id, name, color, is_admin, created_at) VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.color)
        .bind(user.is_admin)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::Conflict(user.id));
        }
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), UserStoreError> {
        let result = sqlx::query("UPDATE sv_user SET name = $1, color = $2, is_admin = $3 WHERE id = $4")
            .bind(&user.name)
            .bind(&user.color)
            .bind(user.is_admin)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(user.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), UserStoreError> {
        let result = sqlx::query("DELETE FROM sv_user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
