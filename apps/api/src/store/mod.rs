//! Persistence seams used by the matching pipeline.
//!
//! The relational schema and resume file storage belong to the surrounding
//! account subsystem; these traits are the only operations the pipeline needs.

pub mod postgres;
pub mod resumes;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;
use crate::models::experience::{WorkExperienceRecord, WorkExperienceRow};

#[async_trait]
pub trait ExperienceStore: Send + Sync {
    /// Inserts every record for `username` in one transaction.
    /// Either all rows commit or none do.
    async fn insert_all(
        &self,
        username: &str,
        records: &[WorkExperienceRecord],
    ) -> Result<Vec<WorkExperienceRow>, AppError>;

    async fn list(&self, username: &str) -> Result<Vec<WorkExperienceRow>, AppError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Storage path of the user's on-file resume, if one was uploaded.
    async fn resume_path(&self, username: &str) -> Result<Option<String>, AppError>;

    async fn set_resume_path(&self, username: &str, path: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PostingStore: Send + Sync {
    async fn job_description(&self, posting_id: i64) -> Result<Option<String>, AppError>;
}

/// "Store bytes, return a path."
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn put(&self, username: &str, extension: &str, bytes: Bytes) -> Result<String, AppError>;

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError>;
}

/// The storage collaborators the matching pipeline is wired with.
#[derive(Clone)]
pub struct Stores {
    pub experiences: Arc<dyn ExperienceStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub postings: Arc<dyn PostingStore>,
    pub resumes: Arc<dyn ResumeStore>,
}
