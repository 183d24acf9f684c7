use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::experience::{WorkExperienceRecord, WorkExperienceRow};
use crate::store::{AccountStore, ExperienceStore, PostingStore};

/// PostgreSQL-backed implementation of the relational stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the connection pool shared by all stores.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ExperienceStore for PgStore {
    async fn insert_all(
        &self,
        username: &str,
        records: &[WorkExperienceRecord],
    ) -> Result<Vec<WorkExperienceRow>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            let row = sqlx::query_as::<_, WorkExperienceRow>(
                r#"
                INSERT INTO job_experiences
                    (id, username, job_title, company_name, location, duration, description, skills)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(&record.job_title)
            .bind(&record.company_name)
            .bind(&record.location)
            .bind(&record.duration)
            .bind(&record.description)
            .bind(&record.skills)
            .fetch_one(&mut *tx)
            .await?;
            rows.push(row);
        }

        tx.commit().await?;

        info!("Stored {} work experience records for {username}", rows.len());
        Ok(rows)
    }

    async fn list(&self, username: &str) -> Result<Vec<WorkExperienceRow>, AppError> {
        Ok(sqlx::query_as::<_, WorkExperienceRow>(
            "SELECT * FROM job_experiences WHERE username = $1 ORDER BY created_at ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn resume_path(&self, username: &str) -> Result<Option<String>, AppError> {
        let path: Option<Option<String>> =
            sqlx::query_scalar("SELECT resume_path FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(path.flatten())
    }

    async fn set_resume_path(&self, username: &str, path: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET resume_path = $1 WHERE username = $2")
            .bind(path)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {username} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl PostingStore for PgStore {
    async fn job_description(&self, posting_id: i64) -> Result<Option<String>, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT job_description FROM recruiter_postings WHERE posting_id = $1",
        )
        .bind(posting_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
