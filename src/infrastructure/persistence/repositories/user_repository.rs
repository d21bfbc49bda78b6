use crate::domain::repositories::UserRepository;
use crate::domain::tracking::position::UserId;
use crate::domain::tracking::user::{User, UserEmail};
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

pub struct SqliteUserRepository {
    database: Database,
}

impl SqliteUserRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<UserId> {
        user.validate()?;

        let mut tx = self
            .database
            .pool
            .begin()
            .await
            .context("Failed to begin user transaction")?;

        let id = sqlx::query("INSERT INTO users (name, cooldown_secs) VALUES (?, ?)")
            .bind(&user.name)
            .bind(user.notification_cooldown.num_seconds())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to save user {}", user.name))?
            .last_insert_rowid();

        for email in &user.emails {
            sqlx::query("INSERT INTO user_emails (user_id, email, is_primary) VALUES (?, ?, ?)")
                .bind(id)
                .bind(&email.email)
                .bind(email.is_primary)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to save email {}", email.email))?;
        }

        tx.commit().await.context("Failed to commit user transaction")?;

        info!("Persisted user {} ({})", id, user.name);
        Ok(id)
    }

    async fn find(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT id, name, cooldown_secs FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.database.pool)
        .await
        .with_context(|| format!("Failed to load user {}", id))?;

        let Some((id, name, cooldown_secs)) = row else {
            return Ok(None);
        };

        let emails = sqlx::query_as::<_, (String, bool)>(
            r#"
            SELECT email, is_primary FROM user_emails
            WHERE user_id = ?
            ORDER BY is_primary DESC, rowid ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.database.pool)
        .await
        .with_context(|| format!("Failed to load emails of user {}", id))?
        .into_iter()
        .map(|(email, is_primary)| UserEmail { email, is_primary })
        .collect();

        Ok(Some(User {
            id,
            name,
            emails,
            notification_cooldown: Duration::seconds(cooldown_secs),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM user_emails WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.database.pool)
                .await
                .with_context(|| format!("Failed to look up {}", email))?;

        match user_id {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_any_email() {
        let repo = SqliteUserRepository::new(Database::in_memory().await.unwrap());
        let user = User::new("Test User", "test@example.org", Duration::hours(24))
            .with_secondary_email("test@example2.org");
        let id = repo.insert(&user).await.unwrap();

        let by_secondary = repo.find_by_email("test@example2.org").await.unwrap().unwrap();
        assert_eq!(by_secondary, User { id, ..user });
        assert_eq!(by_secondary.primary_email(), Some("test@example.org"));
        assert!(repo.find_by_email("nobody@example.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_user_without_primary() {
        let repo = SqliteUserRepository::new(Database::in_memory().await.unwrap());
        let mut user = User::new("Test User", "test@example.org", Duration::minutes(5));
        user.emails[0].is_primary = false;

        assert!(repo.insert(&user).await.is_err());
    }
}
