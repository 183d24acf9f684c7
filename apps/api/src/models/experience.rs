use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Heuristic resume-to-posting score. Produced per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Always within `0..=100`.
    pub match_percentage: u8,
    pub explanation: String,
}

/// One past job extracted from a resume or entered by hand.
/// `skills` is stored comma-joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperienceRecord {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub duration: String,
    pub description: String,
    pub skills: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperienceRow {
    pub id: Uuid,
    pub username: String,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub duration: String,
    pub description: String,
    pub skills: Option<String>,
    pub created_at: DateTime<Utc>,
}
