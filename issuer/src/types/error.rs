//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_types::{
    ErrorResponse, FILE_NAME_INVALID, FILE_NAME_REQUIRED, SAS_GENERATION_FAILED,
};

use crate::blob_storage::ObjectNameError;
use crate::upload_grant::IssueError;

/// Application error: a status code plus the `{ "error": ... }` envelope
///
/// The optional cause is logged once when the response is built and never sent.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    cause: Option<String>,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            cause: None,
        }
    }

    /// Attach the underlying cause for the server log
    #[must_use]
    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Status code of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the client
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let cause = self.cause.as_deref().unwrap_or("-");
        match self.status.as_u16() {
            400..=499 => tracing::warn!(status = %self.status, cause, "Client error: {}", self.message),
            500..=599 => tracing::error!(status = %self.status, cause, "Server error: {}", self.message),
            _ => {}
        }

        (
            self.status,
            Json(ErrorResponse {
                error: self.message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Convert issuance errors to application errors; the cause stays in the server log
impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        let error = match &err {
            IssueError::Validation(ObjectNameError::Missing) => {
                Self::new(StatusCode::BAD_REQUEST, FILE_NAME_REQUIRED)
            }
            IssueError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, FILE_NAME_INVALID),
            IssueError::Dependency(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, SAS_GENERATION_FAILED)
            }
        };
        error.with_cause(err)
    }
}

impl OperationOutput for AppError {
    type Inner = ErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use http_body_util::BodyExt;

    use super::*;
    use crate::blob_storage::StorageError;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8(self.0.lock().unwrap().clone())
                .unwrap()
                .lines()
                .map(ToString::to_string)
                .collect()
        }
    }

    /// Builds the response for `error` and returns every log line it produced
    fn logs_of(error: impl FnOnce() -> AppError) -> Vec<String> {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let _ = error().into_response();
        });
        logs.lines()
    }

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn missing_name_maps_to_required_message() {
        let (status, body) =
            body_of(IssueError::Validation(ObjectNameError::Missing).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "fileName is required" }));
    }

    #[tokio::test]
    async fn invalid_name_maps_to_invalid_message() {
        let (status, body) = body_of(
            IssueError::Validation(ObjectNameError::InvalidSegment("..".to_string())).into(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "fileName is invalid");
    }

    #[tokio::test]
    async fn dependency_failure_hides_the_cause() {
        let (status, body) = body_of(
            IssueError::Dependency(StorageError::Unauthorized("secret detail".to_string()))
                .into(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({ "error": "Error generating SAS URL" }));
    }

    #[test]
    fn dependency_failure_is_logged_once_with_its_cause() {
        let lines = logs_of(|| {
            IssueError::Dependency(StorageError::Unauthorized("key rejected".to_string())).into()
        });

        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("key rejected"));
    }

    #[test]
    fn validation_failure_is_logged_once_as_warning() {
        let lines = logs_of(|| {
            IssueError::Validation(ObjectNameError::InvalidSegment("..".to_string())).into()
        });

        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].contains("WARN"));
    }
}
