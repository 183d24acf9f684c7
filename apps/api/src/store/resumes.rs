use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::store::ResumeStore;

/// Resume files kept in S3 (MinIO locally). The object key is the stored path.
#[derive(Clone)]
pub struct S3ResumeStore {
    client: S3Client,
    bucket: String,
}

impl S3ResumeStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

/// Object key for a new upload: `resumes/{username}/{uuid}.{ext}`.
pub fn resume_key(username: &str, extension: &str) -> String {
    format!("resumes/{}/{}.{}", username, Uuid::new_v4(), extension)
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl ResumeStore for S3ResumeStore {
    async fn put(&self, username: &str, extension: &str, bytes: Bytes) -> Result<String, AppError> {
        let key = resume_key(username, extension);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(extension))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded resume to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 download of {path} failed: {e}")))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 read of {path} failed: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_layout() {
        let key = resume_key("jdoe", "pdf");
        assert!(key.starts_with("resumes/jdoe/"));
        assert!(key.ends_with(".pdf"));
        assert_ne!(key, resume_key("jdoe", "pdf"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("pdf"), "application/pdf");
        assert_eq!(content_type_for("txt"), "text/plain");
        assert_eq!(content_type_for("docx"), "application/octet-stream");
    }
}
