use crate::api::ErrorResponse;
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Failure taxonomy shared by the quiz pipeline and the route layer
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Invalid request: {0}")]
    CallerInput(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned an unexpected response: {detail}")]
    MalformedUpstreamResponse {
        provider: &'static str,
        detail: String,
    },

    #[error("Failed to parse model output as JSON: {message}; cleaned text: {text}")]
    ResponseParse { message: String, text: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl QuizError {
    pub fn upstream(provider: &'static str, message: impl Into<String>) -> Self {
        QuizError::Upstream {
            provider,
            message: message.into(),
        }
    }

    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        QuizError::MalformedUpstreamResponse {
            provider,
            detail: detail.into(),
        }
    }
}

/// Fixed text for a missing document; operation-specific messages never replace it
pub const DOCUMENT_NOT_FOUND_MESSAGE: &str =
    "File not found. It may have expired. Please upload again.";

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub handle: Option<String>,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            handle: None,
            user_friendly_message: None,
        }
    }

    pub fn with_handle(mut self, handle: &str) -> Self {
        self.handle = Some(handle.to_string());
        self
    }

    /// Message shown to the caller for pipeline failures; the error itself goes in `details`
    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl QuizError {
    /// Convert the error to an HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ErrorResponse>) {
        match &self {
            QuizError::CallerInput(message) => {
                warn!(
                    operation = %context.operation,
                    handle = ?context.handle,
                    error = %self,
                    "Rejected caller input"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new(message.clone())),
                )
            }
            QuizError::DocumentNotFound(_) => {
                info!(
                    operation = %context.operation,
                    handle = ?context.handle,
                    error = %self,
                    "Document not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse::new(DOCUMENT_NOT_FOUND_MESSAGE.to_string())),
                )
            }
            QuizError::Upstream { provider, .. }
            | QuizError::MalformedUpstreamResponse { provider, .. } => {
                error!(
                    operation = %context.operation,
                    handle = ?context.handle,
                    provider = %provider,
                    error = %self,
                    "LLM provider call failed"
                );
                internal_error(context, &self)
            }
            QuizError::ResponseParse { .. } => {
                error!(
                    operation = %context.operation,
                    handle = ?context.handle,
                    error = %self,
                    "Model output could not be parsed"
                );
                internal_error(context, &self)
            }
            QuizError::Storage(_) => {
                error!(
                    operation = %context.operation,
                    handle = ?context.handle,
                    error = %self,
                    "Document storage error"
                );
                internal_error(context, &self)
            }
        }
    }
}

fn internal_error(context: ErrorContext, error: &QuizError) -> (StatusCode, Json<ErrorResponse>) {
    let message = context
        .user_friendly_message
        .unwrap_or_else(|| "An internal error occurred. Please try again.".to_string());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_details(message, error.to_string())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("generate_quiz")
            .with_handle("1700000000000-notes.pdf")
            .with_user_message("Custom message");

        assert_eq!(context.operation, "generate_quiz");
        assert_eq!(context.handle.as_deref(), Some("1700000000000-notes.pdf"));
        assert_eq!(
            context.user_friendly_message,
            Some("Custom message".to_string())
        );
    }

    #[test]
    fn test_status_mapping() {
        let (status, body) = QuizError::CallerInput("Missing required parameters.".into())
            .to_response_with_context(ErrorContext::new("generate_quiz"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Missing required parameters.");
        assert!(body.details.is_none());

        let (status, body) = QuizError::DocumentNotFound("x.pdf".into())
            .to_response_with_context(
                ErrorContext::new("generate_quiz")
                    .with_user_message("Failed to generate quiz from AI."),
            );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, DOCUMENT_NOT_FOUND_MESSAGE);
        assert!(body.details.is_none());

        let (status, body) = QuizError::upstream("Gemini", "status 503")
            .to_response_with_context(
                ErrorContext::new("upload_and_analyze")
                    .with_user_message("Failed to process PDF with AI."),
            );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.success);
        assert_eq!(body.error, "Failed to process PDF with AI.");
        assert_eq!(
            body.details.as_deref(),
            Some("Gemini request failed: status 503")
        );
    }

    #[test]
    fn test_parse_error_keeps_cleaned_text() {
        let err = QuizError::ResponseParse {
            message: "expected value at line 1 column 1".into(),
            text: "not json".into(),
        };
        let (status, body) = err.to_response_with_context(ErrorContext::new("generate_quiz"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.0.details.unwrap().contains("not json"));
    }
}
