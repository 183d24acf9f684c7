//! Axum route handlers for the Matching API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::orchestrator::ModelStatus;
use crate::models::account::Identity;
use crate::models::experience::{MatchResult, WorkExperienceRecord, WorkExperienceRow};
use crate::state::AppState;

/// Form field carrying the document for the extraction and advice endpoints.
pub const DOCUMENT_FIELD: &str = "file";
/// Form field carrying a resume upload.
pub const RESUME_FIELD: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    #[serde(rename = "Task complete")]
    Complete,
    #[serde(rename = "Task failed")]
    TaskFailed,
    /// The request carried no file at all.
    #[serde(rename = "Failed")]
    Failed,
}

/// Body of the document-processing endpoints.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub status: TaskStatus,
    pub result: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<WorkExperienceRecord>,
}

impl TaskResponse {
    fn complete(result: String, records: Vec<WorkExperienceRecord>) -> Self {
        Self {
            status: TaskStatus::Complete,
            result,
            records,
        }
    }

    fn no_file() -> Response {
        let body = Self {
            status: TaskStatus::Failed,
            result: "No file sent".to_string(),
            records: vec![],
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }

    fn failed(err: AppError) -> Response {
        let status = err.status();
        tracing::warn!("Task failed ({}): {err}", err.code());
        let body = Self {
            status: TaskStatus::TaskFailed,
            result: err.user_message(),
            records: vec![],
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub resume_path: String,
}

#[derive(Debug, Deserialize)]
pub struct NewWorkExperience {
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub duration: String,
    pub description: String,
    #[serde(default)]
    pub skills: String,
}

impl NewWorkExperience {
    fn validate(self) -> Result<WorkExperienceRecord, AppError> {
        let required = [
            ("job_title", &self.job_title),
            ("company_name", &self.company_name),
            ("location", &self.location),
            ("duration", &self.duration),
            ("description", &self.description),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
        Ok(WorkExperienceRecord {
            job_title: self.job_title,
            company_name: self.company_name,
            location: self.location,
            duration: self.duration,
            description: self.description,
            skills: self.skills,
        })
    }
}

/// A file pulled out of a multipart form.
struct Upload {
    filename: Option<String>,
    bytes: Bytes,
}

/// Reads the named field; `Ok(None)` when the form has no such field.
async fn read_field(multipart: &mut Multipart, name: &str) -> Result<Option<Upload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let filename = field.file_name().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok(Some(Upload { filename, bytes }));
    }
    Ok(None)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /match-resume/:posting_id
///
/// Scores the caller's on-file resume against the posting's job description.
pub async fn handle_match_resume(
    State(state): State<AppState>,
    identity: Identity,
    Path(posting_id): Path<i64>,
) -> Result<Json<MatchResult>, AppError> {
    let result = state
        .matching
        .match_on_file_resume(&identity, posting_id)
        .await?;
    Ok(Json(result))
}

/// POST /extract-work-experience
///
/// Extracts work experience from an uploaded PDF and stores it for the caller.
pub async fn handle_extract_work_experience(
    State(state): State<AppState>,
    identity: Identity,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_field(&mut multipart, DOCUMENT_FIELD).await {
        Ok(Some(upload)) if !upload.bytes.is_empty() => upload,
        Ok(_) => return TaskResponse::no_file(),
        Err(e) => return TaskResponse::failed(e),
    };

    match state
        .matching
        .extract_work_experience(upload.bytes.to_vec(), &identity)
        .await
    {
        Ok(outcome) => Json(TaskResponse::complete(outcome.raw_json, outcome.records)).into_response(),
        Err(e) => TaskResponse::failed(e),
    }
}

/// POST /resume-advice
///
/// Returns the model's improvement suggestions for an uploaded PDF.
pub async fn handle_resume_advice(
    State(state): State<AppState>,
    _identity: Identity,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_field(&mut multipart, DOCUMENT_FIELD).await {
        Ok(Some(upload)) if !upload.bytes.is_empty() => upload,
        Ok(_) => return TaskResponse::no_file(),
        Err(e) => return TaskResponse::failed(e),
    };

    match state.matching.resume_advice(upload.bytes.to_vec()).await {
        Ok(advice) => Json(TaskResponse::complete(advice, vec![])).into_response(),
        Err(e) => TaskResponse::failed(e),
    }
}

/// GET /model-status
pub async fn handle_model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.matching.model_status().await)
}

/// POST /resume
///
/// Stores the caller's resume and records its path on the account.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let upload = read_field(&mut multipart, RESUME_FIELD)
        .await?
        .ok_or_else(|| AppError::Validation("No resume file attached".to_string()))?;
    let filename = upload
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::Validation("No selected file".to_string()))?;

    let resume_path = state
        .matching
        .upload_resume(&identity, &filename, upload.bytes)
        .await?;
    Ok(Json(ResumeUploadResponse { resume_path }))
}

/// GET /work-experience
pub async fn handle_list_work_experience(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<WorkExperienceRow>>, AppError> {
    Ok(Json(state.matching.work_experience(&identity).await?))
}

/// POST /work-experience
///
/// Manual entry of a single record.
pub async fn handle_add_work_experience(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<NewWorkExperience>,
) -> Result<(StatusCode, Json<WorkExperienceRow>), AppError> {
    let record = request.validate()?;
    let row = state
        .matching
        .add_work_experience(&identity, record)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::document::fixtures::pdf_with_pages;
    use crate::matching::testing::{service_with, MemoryStore, ScriptedModel, CONFIGURED_MODEL};
    use crate::models::account::IDENTITY_HEADER;
    use crate::routes::build_router;

    const BOUNDARY: &str = "jobmatch-test-boundary";

    fn app(model: ScriptedModel, store: MemoryStore) -> axum::Router {
        let (service, _) = service_with(model, store);
        build_router(AppState {
            matching: Arc::new(service),
            max_upload_bytes: 1024 * 1024,
        })
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(IDENTITY_HEADER, "jdoe")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_task_status_strings() {
        assert_eq!(
            serde_json::to_value(TaskStatus::Complete).unwrap(),
            "Task complete"
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::TaskFailed).unwrap(),
            "Task failed"
        );
        assert_eq!(serde_json::to_value(TaskStatus::Failed).unwrap(), "Failed");
    }

    #[test]
    fn test_manual_entry_requires_fields() {
        let entry = NewWorkExperience {
            job_title: "Engineer".to_string(),
            company_name: " ".to_string(),
            location: "NY".to_string(),
            duration: "2y".to_string(),
            description: "Built X".to_string(),
            skills: String::new(),
        };
        let err = entry.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("company_name")));
    }

    #[tokio::test]
    async fn test_match_resume_without_resume_returns_error_body() {
        let app = app(
            ScriptedModel::replying(CONFIGURED_MODEL, "85% match."),
            MemoryStore::default().with_user("jdoe").with_posting(1, "Rust role"),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/match-resume/1")
            .header(IDENTITY_HEADER, "jdoe")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NO_RESUME_ON_FILE");
    }

    #[tokio::test]
    async fn test_match_resume_returns_score() {
        let app = app(
            ScriptedModel::replying(
                CONFIGURED_MODEL,
                "85% match. Strong alignment on language and leadership.",
            ),
            MemoryStore::default()
                .with_posting(4, "Senior Python Engineer")
                .with_resume("jdoe", "resumes/jdoe/cv.txt", b"5 years Python, led team of 4"),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/match-resume/4")
            .header(IDENTITY_HEADER, "jdoe")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["match_percentage"], 85);
        assert_eq!(
            body["explanation"],
            "Strong alignment on language and leadership."
        );
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = app(
            ScriptedModel::replying(CONFIGURED_MODEL, ""),
            MemoryStore::default(),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/match-resume/1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extract_without_file_is_failed() {
        let app = app(
            ScriptedModel::replying(CONFIGURED_MODEL, "[]"),
            MemoryStore::default(),
        );
        let body = multipart_body("other", "cv.pdf", b"%PDF-1.4");

        let response = app
            .oneshot(upload_request("/extract-work-experience", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "Failed");
    }

    #[tokio::test]
    async fn test_extract_non_pdf_is_task_failed() {
        let app = app(
            ScriptedModel::replying(CONFIGURED_MODEL, "[]"),
            MemoryStore::default(),
        );
        let body = multipart_body(DOCUMENT_FIELD, "cv.docx", b"PK\x03\x04 word document");

        let response = app
            .oneshot(upload_request("/extract-work-experience", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert_eq!(body["status"], "Task failed");
    }

    #[tokio::test]
    async fn test_extract_work_experience_complete() {
        let reply = r#"Sure! [{"job_title":"Engineer","company_name":"Acme","location":"NY","duration":"2y","description":"Built X","skills":["Go","SQL"]}]"#;
        let store = MemoryStore::default();
        let app = app(ScriptedModel::replying(CONFIGURED_MODEL, reply), store.clone());
        let body = multipart_body(DOCUMENT_FIELD, "cv.pdf", &pdf_with_pages(&["Engineer at Acme"]));

        let response = app
            .oneshot(upload_request("/extract-work-experience", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "Task complete");
        assert!(body["result"].as_str().unwrap().starts_with('['));
        assert_eq!(body["records"][0]["skills"], "Go,SQL");
        assert_eq!(store.experiences_for("jdoe").len(), 1);
    }

    #[tokio::test]
    async fn test_model_status_endpoint() {
        let app = app(
            ScriptedModel::replying("llama3:8b", ""),
            MemoryStore::default(),
        );
        let request = Request::builder()
            .uri("/model-status")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let body = json_body(response).await;
        assert_eq!(body["model"], CONFIGURED_MODEL);
        assert_eq!(body["ready"], false);
        assert_eq!(body["reachable"], true);
    }
}
