//! Matching Orchestrator — PDF text → model call → interpretation → storage.
//!
//! Every request walks `Received → TextExtracted → ModelInvoked → Interpreted`
//! and ends `Persisted` or `Rejected`. Nothing is retried; a failure at any
//! stage ends the request with a reported `AppError`.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::document::{extract_pdf_text, extract_resume_text};
use crate::errors::AppError;
use crate::llm_client::{LanguageModel, LlmError};
use crate::matching::interpreter::ResponseInterpreter;
use crate::matching::prompts::{match_prompt, resume_advice_prompt, work_experience_prompt};
use crate::models::account::Identity;
use crate::models::experience::{MatchResult, WorkExperienceRecord, WorkExperienceRow};
use crate::store::Stores;

/// Extensions accepted for an on-file resume.
pub const RESUME_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Settings fixed when the orchestrator is built.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub model: String,
}

impl From<&Config> for MatchingConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.llm_model.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    TextExtracted,
    ModelInvoked,
    Interpreted,
    Persisted,
    Rejected,
}

/// Per-request stage tracker; logs each transition under one request id.
struct RequestTrace {
    id: Uuid,
    operation: &'static str,
    stage: Stage,
}

impl RequestTrace {
    fn start(operation: &'static str) -> Self {
        let id = Uuid::new_v4();
        debug!(request_id = %id, operation, "stage Received");
        Self {
            id,
            operation,
            stage: Stage::Received,
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        debug!(request_id = %self.id, operation = self.operation, "stage {stage:?}");
    }

    fn finish<T>(mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            warn!(
                request_id = %self.id,
                operation = self.operation,
                failed_after = ?self.stage,
                code = e.code(),
                "request rejected: {e}"
            );
            self.advance(Stage::Rejected);
        }
        result
    }
}

/// Records extracted from a resume, plus the bracketed JSON they came from.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub records: Vec<WorkExperienceRecord>,
    pub raw_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model: String,
    pub reachable: bool,
    pub ready: bool,
}

#[derive(Clone)]
pub struct MatchingService {
    llm: Arc<dyn LanguageModel>,
    interpreter: Arc<dyn ResponseInterpreter>,
    stores: Stores,
    config: MatchingConfig,
}

impl MatchingService {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        interpreter: Arc<dyn ResponseInterpreter>,
        stores: Stores,
        config: MatchingConfig,
    ) -> Self {
        Self {
            llm,
            interpreter,
            stores,
            config,
        }
    }

    /// Availability check followed by the single generation call.
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        self.llm.ensure_available(&self.config.model).await?;
        Ok(self.llm.chat(&self.config.model, prompt).await?)
    }

    /// Scores a resume (PDF or plain text bytes) against a job description.
    /// Read-only with respect to storage.
    pub async fn match_resume_to_job(
        &self,
        resume: Vec<u8>,
        job_description: &str,
    ) -> Result<MatchResult, AppError> {
        let mut trace = RequestTrace::start("match_resume");
        let result = self.run_match(&mut trace, resume, job_description).await;
        trace.finish(result)
    }

    async fn run_match(
        &self,
        trace: &mut RequestTrace,
        resume: Vec<u8>,
        job_description: &str,
    ) -> Result<MatchResult, AppError> {
        let resume_text = extract_resume_text(resume).await?;
        if resume_text.trim().is_empty() {
            return Err(AppError::NoResumeOnFile);
        }
        trace.advance(Stage::TextExtracted);

        let response = self
            .generate(&match_prompt(&resume_text, job_description))
            .await?;
        trace.advance(Stage::ModelInvoked);

        let result = self.interpreter.match_result(&response);
        trace.advance(Stage::Interpreted);
        Ok(result)
    }

    /// Matches the identity's on-file resume against a posting.
    pub async fn match_on_file_resume(
        &self,
        identity: &Identity,
        posting_id: i64,
    ) -> Result<MatchResult, AppError> {
        let path = self
            .stores
            .accounts
            .resume_path(&identity.username)
            .await?
            .ok_or(AppError::NoResumeOnFile)?;

        let job_description = self
            .stores
            .postings
            .job_description(posting_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Posting {posting_id} not found")))?;

        let resume = self.stores.resumes.get(&path).await?;
        let result = self.match_resume_to_job(resume, &job_description).await?;

        info!(
            "Matched resume of {} against posting {posting_id}: {}%",
            identity.username, result.match_percentage
        );
        Ok(result)
    }

    /// Extracts work-experience records from a PDF resume and stores them for
    /// `identity`. The batch is written in one transaction.
    pub async fn extract_work_experience(
        &self,
        resume: Vec<u8>,
        identity: &Identity,
    ) -> Result<ExtractionOutcome, AppError> {
        let mut trace = RequestTrace::start("extract_work_experience");
        let result = self.run_extraction(&mut trace, resume, identity).await;
        trace.finish(result)
    }

    async fn run_extraction(
        &self,
        trace: &mut RequestTrace,
        resume: Vec<u8>,
        identity: &Identity,
    ) -> Result<ExtractionOutcome, AppError> {
        let text = extract_pdf_text(resume).await?;
        if text.trim().is_empty() {
            return Err(AppError::EmptyDocument);
        }
        trace.advance(Stage::TextExtracted);

        let response = self.generate(&work_experience_prompt(&text)).await?;
        trace.advance(Stage::ModelInvoked);

        let parsed = self.interpreter.work_experience(&response)?;
        trace.advance(Stage::Interpreted);

        if !parsed.records.is_empty() {
            self.stores
                .experiences
                .insert_all(&identity.username, &parsed.records)
                .await?;
        }
        trace.advance(Stage::Persisted);

        info!(
            "Extracted {} work experience records for {}",
            parsed.records.len(),
            identity.username
        );
        Ok(ExtractionOutcome {
            records: parsed.records,
            raw_json: parsed.raw_json,
        })
    }

    /// Free-form improvement suggestions for a PDF resume. Returned unparsed.
    pub async fn resume_advice(&self, resume: Vec<u8>) -> Result<String, AppError> {
        let mut trace = RequestTrace::start("resume_advice");
        let result = self.run_advice(&mut trace, resume).await;
        trace.finish(result)
    }

    async fn run_advice(&self, trace: &mut RequestTrace, resume: Vec<u8>) -> Result<String, AppError> {
        let text = extract_pdf_text(resume).await?;
        if text.trim().is_empty() {
            return Err(AppError::EmptyDocument);
        }
        trace.advance(Stage::TextExtracted);

        let advice = self.generate(&resume_advice_prompt(&text)).await?;
        trace.advance(Stage::ModelInvoked);
        Ok(advice)
    }

    /// Whether the configured model is listed by the model server right now.
    pub async fn model_status(&self) -> ModelStatus {
        let model = self.config.model.clone();
        match self.llm.ensure_available(&model).await {
            Ok(()) => ModelStatus {
                model,
                reachable: true,
                ready: true,
            },
            Err(LlmError::ModelUnavailable(_)) => ModelStatus {
                model,
                reachable: true,
                ready: false,
            },
            Err(e) => {
                warn!("Model server unreachable: {e}");
                ModelStatus {
                    model,
                    reachable: false,
                    ready: false,
                }
            }
        }
    }

    /// Stores a new resume file and records its path for `identity`.
    pub async fn upload_resume(
        &self,
        identity: &Identity,
        filename: &str,
        bytes: Bytes,
    ) -> Result<String, AppError> {
        let extension = allowed_extension(filename).ok_or_else(|| {
            AppError::Validation(format!(
                "Allowed file types are {}",
                RESUME_EXTENSIONS.join(", ")
            ))
        })?;
        if bytes.is_empty() {
            return Err(AppError::Validation("No selected file".to_string()));
        }

        let path = self
            .stores
            .resumes
            .put(&identity.username, &extension, bytes)
            .await?;
        self.stores
            .accounts
            .set_resume_path(&identity.username, &path)
            .await?;
        Ok(path)
    }

    /// Stores one hand-entered record for `identity`.
    pub async fn add_work_experience(
        &self,
        identity: &Identity,
        record: WorkExperienceRecord,
    ) -> Result<WorkExperienceRow, AppError> {
        let mut rows = self
            .stores
            .experiences
            .insert_all(&identity.username, std::slice::from_ref(&record))
            .await?;
        rows.pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("insert returned no row")))
    }

    pub async fn work_experience(
        &self,
        identity: &Identity,
    ) -> Result<Vec<WorkExperienceRow>, AppError> {
        self.stores.experiences.list(&identity.username).await
    }
}

/// Lower-cased extension of `filename` if it is an accepted resume type.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    RESUME_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
