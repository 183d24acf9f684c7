use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

/// Header set by the upstream session layer once a user is authenticated.
pub const IDENTITY_HEADER: &str = "x-username";

/// The authenticated actor (applicant or recruiter) a request runs on behalf of.
///
/// Authentication itself happens upstream; this only reads the forwarded username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(Identity {
            username: username.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Result<Identity, AppError> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_identity_from_header() {
        let request = Request::builder()
            .header(IDENTITY_HEADER, "jdoe")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().username, "jdoe");
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthorized)));

        let request = Request::builder()
            .header(IDENTITY_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(request).await, Err(AppError::Unauthorized)));
    }
}
