// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Every `find_by_*` lookup must hit a row; a miss is reported as
//! [`DataAccessError::NotFound`] for the `User` model.

use chrono::Utc;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

use super::{DataAccessError, Database, StorageResult};

const MODEL: &str = "User";

/// Persisted account row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// UUID v4
    pub id: String,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

/// Fields required to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// Partial update; `None` leaves the column unchanged.
///
/// The nullable columns take `Some(None)` to be set to `NULL`.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<Option<String>>,
    pub image: Option<Option<String>>,
}

/// Columns carrying a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    /// Column name, also used as the conflict key (`user.<name>`).
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Username => "username",
        }
    }
}

/// Repository for users and follow edges.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> StorageResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataAccessError::not_found(MODEL))
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> StorageResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataAccessError::not_found(MODEL))
    }

    #[instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> StorageResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| DataAccessError::not_found(MODEL))
    }

    /// Whether another user already holds `value` in `field`.
    ///
    /// The row with id `except_id` is ignored so a user can keep their own
    /// email or username on update.
    #[instrument(skip(self))]
    pub async fn field_taken(
        &self,
        field: UniqueField,
        value: &str,
        except_id: Option<&str>,
    ) -> StorageResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {} = ? AND id IS NOT ?)",
            field.as_str()
        );
        let (taken,): (bool,) = sqlx::query_as(&sql)
            .bind(value)
            .bind(except_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(taken)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create(&self, user: NewUser) -> StorageResult<User> {
        let now = Utc::now().timestamp_millis();
        let row = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            bio: user.bio,
            image: user.image,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, bio, image, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.email)
        .bind(&row.username)
        .bind(&row.password_hash)
        .bind(&row.bio)
        .bind(&row.image)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(row)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: &str, changes: UserChanges) -> StorageResult<User> {
        let result = sqlx::query(
            "UPDATE users SET
                email = COALESCE(?, email),
                username = COALESCE(?, username),
                password_hash = COALESCE(?, password_hash),
                bio = CASE WHEN ? THEN ? ELSE bio END,
                image = CASE WHEN ? THEN ? ELSE image END,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.bio.is_some())
        .bind(changes.bio.flatten())
        .bind(changes.image.is_some())
        .bind(changes.image.flatten())
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataAccessError::not_found(MODEL));
        }
        self.find_by_id(id).await
    }

    /// Record that `follower_id` follows `followee_id`. Idempotent.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> StorageResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(Utc::now().timestamp_millis())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Remove the follow edge if present. Idempotent.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> StorageResult<bool> {
        let (following,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(following)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            password_hash: "hash".to_string(),
            bio: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_each_key() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let created = users.create(new_user("jake")).await.unwrap();

        assert_eq!(users.find_by_id(&created.id).await.unwrap(), created);
        assert_eq!(users.find_by_email("jake@example.com").await.unwrap(), created);
        assert_eq!(users.find_by_username("jake").await.unwrap(), created);
        assert!(Uuid::parse_str(&created.id).is_ok());
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let err = db.users().find_by_username("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            DataAccessError::NotFound { model: Some(ref m), .. } if m == "User"
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_query_error() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        users.create(new_user("jake")).await.unwrap();
        let mut dup = new_user("other");
        dup.email = "jake@example.com".to_string();
        assert!(matches!(users.create(dup).await, Err(DataAccessError::Query(_))));
    }

    #[tokio::test]
    async fn field_taken_ignores_own_row() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let jake = users.create(new_user("jake")).await.unwrap();

        assert!(users.field_taken(UniqueField::Username, "jake", None).await.unwrap());
        assert!(!users
            .field_taken(UniqueField::Username, "jake", Some(jake.id.as_str()))
            .await
            .unwrap());
        assert!(!users.field_taken(UniqueField::Email, "free@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let jake = users.create(new_user("jake")).await.unwrap();

        let updated = users
            .update(
                &jake.id,
                UserChanges {
                    bio: Some(Some("I work at statefarm".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("I work at statefarm"));
        assert_eq!(updated.email, jake.email);
        assert_eq!(updated.password_hash, jake.password_hash);
        assert!(updated.updated_at >= jake.updated_at);
    }

    #[tokio::test]
    async fn update_can_null_out_bio_and_image() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let mut jake = new_user("jake");
        jake.bio = Some("I work at statefarm".to_string());
        jake.image = Some("https://example.com/jake.png".to_string());
        let jake = users.create(jake).await.unwrap();

        let kept = users
            .update(
                &jake.id,
                UserChanges {
                    username: Some("jacob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.bio, jake.bio);
        assert_eq!(kept.image, jake.image);

        let cleared = users
            .update(
                &jake.id,
                UserChanges {
                    bio: Some(None),
                    image: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
        assert_eq!(cleared.image, None);
        assert_eq!(cleared.username, "jacob");
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .users()
            .update("nope", UserChanges::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn follow_edges_are_idempotent() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        let jake = users.create(new_user("jake")).await.unwrap();
        let anna = users.create(new_user("anna")).await.unwrap();

        users.follow(&jake.id, &anna.id).await.unwrap();
        users.follow(&jake.id, &anna.id).await.unwrap();
        assert!(users.is_following(&jake.id, &anna.id).await.unwrap());
        assert!(!users.is_following(&anna.id, &jake.id).await.unwrap());

        users.unfollow(&jake.id, &anna.id).await.unwrap();
        users.unfollow(&jake.id, &anna.id).await.unwrap();
        assert!(!users.is_following(&jake.id, &anna.id).await.unwrap());
    }
}
