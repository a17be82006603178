use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{credential::CredentialToken, oauth::OauthTokenRecord, user::PortalUser};

use super::repository::{
    CredentialTokenRepository, OauthTokenRepository, PortalRepository, PortalUserRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PortalRepository for SqliteRepository {}

#[async_trait]
impl OauthTokenRepository for SqliteRepository {
    async fn get_oauth_record(&self) -> Result<Option<OauthTokenRecord>> {
        let record = sqlx::query_as::<_, OauthTokenRecord>(
            "SELECT refresh_token_enc, last_refreshed, updated_at FROM oauth_token WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn put_oauth_record(&self, record: &OauthTokenRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO oauth_token (id, refresh_token_enc, last_refreshed, updated_at)
             VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 refresh_token_enc = excluded.refresh_token_enc,
                 last_refreshed = excluded.last_refreshed,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.refresh_token_enc)
        .bind(record.last_refreshed)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialTokenRepository for SqliteRepository {
    async fn put_credential_token(&self, token: &CredentialToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO credential_tokens (token, email, user_uuid, purpose, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(&token.user_uuid)
        .bind(&token.purpose)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_credential_token(&self, token: &str) -> Result<Option<CredentialToken>> {
        let row = sqlx::query_as::<_, CredentialToken>(
            "SELECT token, email, user_uuid, purpose, created_at, expires_at
             FROM credential_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_credential_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credential_tokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_credential_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM credential_tokens WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PortalUserRepository for SqliteRepository {
    async fn create_user(&self, user: &PortalUser) -> Result<()> {
        sqlx::query(
            "INSERT INTO portal_users (uuid, email, company_uuid, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.uuid)
        .bind(&user.email)
        .bind(&user.company_uuid)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, uuid: &str) -> Result<Option<PortalUser>> {
        let row = sqlx::query_as::<_, PortalUser>(
            "SELECT uuid, email, company_uuid, password_hash, created_at, updated_at
             FROM portal_users WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<PortalUser>> {
        let row = sqlx::query_as::<_, PortalUser>(
            "SELECT uuid, email, company_uuid, password_hash, created_at, updated_at
             FROM portal_users WHERE email = ?",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_password_hash(&self, uuid: &str, hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE portal_users SET password_hash = ?, updated_at = ? WHERE uuid = ?",
        )
        .bind(hash)
        .bind(Utc::now())
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabasePool;
    use chrono::Duration;

    async fn test_repo() -> SqliteRepository {
        let pool = match DatabasePool::new_sqlite_memory().await.unwrap() {
            DatabasePool::Sqlite(p) => p,
        };
        SqliteRepository::new(pool)
    }

    fn sample_token(token: &str, expires_in_hours: i64) -> CredentialToken {
        let now = Utc::now();
        CredentialToken {
            token: token.into(),
            email: "a@b.com".into(),
            user_uuid: "uuid-1".into(),
            purpose: "password_reset".into(),
            created_at: now,
            expires_at: now + Duration::hours(expires_in_hours),
        }
    }

    #[tokio::test]
    async fn oauth_record_absent_until_seeded() {
        let repo = test_repo().await;
        assert!(repo.get_oauth_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oauth_record_overwrites_in_place() {
        let repo = test_repo().await;
        let now = Utc::now();
        repo.put_oauth_record(&OauthTokenRecord {
            refresh_token_enc: "enc-r0".into(),
            last_refreshed: None,
            updated_at: now,
        })
        .await
        .unwrap();

        repo.put_oauth_record(&OauthTokenRecord {
            refresh_token_enc: "enc-r1".into(),
            last_refreshed: Some(now),
            updated_at: now,
        })
        .await
        .unwrap();

        let record = repo.get_oauth_record().await.unwrap().unwrap();
        assert_eq!(record.refresh_token_enc, "enc-r1");
        assert!(record.last_refreshed.is_some());
    }

    #[tokio::test]
    async fn credential_token_round_trip() {
        let repo = test_repo().await;
        repo.put_credential_token(&sample_token("tok-1", 24))
            .await
            .unwrap();

        let stored = repo.get_credential_token("tok-1").await.unwrap().unwrap();
        assert_eq!(stored.email, "a@b.com");
        assert_eq!(stored.user_uuid, "uuid-1");
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let repo = test_repo().await;
        repo.put_credential_token(&sample_token("tok-1", 24))
            .await
            .unwrap();

        assert!(repo.delete_credential_token("tok-1").await.unwrap());
        assert!(!repo.delete_credential_token("tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn expired_sweep_removes_only_stale_rows() {
        let repo = test_repo().await;
        repo.put_credential_token(&sample_token("fresh", 24))
            .await
            .unwrap();
        repo.put_credential_token(&sample_token("stale", -1))
            .await
            .unwrap();

        let removed = repo.delete_expired_credential_tokens().await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get_credential_token("fresh").await.unwrap().is_some());
        assert!(repo.get_credential_token("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_lookup_by_email_is_case_normalized() {
        let repo = test_repo().await;
        let user = PortalUser::new("Office@Example.com", Some("company-1"));
        repo.create_user(&user).await.unwrap();

        let found = repo
            .get_user_by_email("OFFICE@example.COM")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.uuid, user.uuid);
    }

    #[tokio::test]
    async fn set_password_hash_reports_missing_user() {
        let repo = test_repo().await;
        assert!(!repo.set_password_hash("nope", "$hash$").await.unwrap());

        let user = PortalUser::new("a@b.com", None);
        repo.create_user(&user).await.unwrap();
        assert!(repo.set_password_hash(&user.uuid, "$hash$").await.unwrap());

        let stored = repo.get_user(&user.uuid).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.as_deref(), Some("$hash$"));
    }
}
