use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::database::document::timestamp_now;
use crate::database::manager::DatabaseError;

/// Trimmed, lower-cased form under which emails are stored and looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// User fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.clone(),
            phone: self.phone.clone(),
            avatar_url: self.avatar_url.clone(),
            is_active: self.is_active,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: String,
    pub phone: Option<String>,
}

/// Self-service profile edit; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, phone, avatar_url, is_active, created_at, updated_at";

pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let email = normalize_email(&new_user.email);
        let now = timestamp_now();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, full_name, role, phone, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(&new_user.password_hash)
        .bind(new_user.full_name.as_deref())
        .bind(&new_user.role)
        .bind(new_user.phone.as_deref())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)
        .map_err(|e| {
            if e.is_unique_violation() {
                DatabaseError::Conflict("Email already registered".to_string())
            } else {
                e
            }
        })?;

        Ok(User {
            id,
            email,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            role: new_user.role,
            phone: new_user.phone,
            avatar_url: None,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET \
                full_name = COALESCE(?, full_name), \
                phone = COALESCE(?, phone), \
                avatar_url = COALESCE(?, avatar_url), \
                updated_at = ? \
             WHERE id = ?",
        )
        .bind(update.full_name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.avatar_url.as_deref())
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }
}
