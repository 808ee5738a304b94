use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::{Request, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    document_store::{DocumentHandle, DocumentStore},
    errors::{ErrorContext, QuizError},
    models::{QuestionCount, Quiz, Topic, WrongAnswerRecord},
    quiz_service::QuizService,
};

// Import logging macros
use crate::{log_api_start, log_api_success, log_api_warn};

pub const UPLOAD_FIELD: &str = "pdf";

const UPLOAD_FAILED: &str = "Failed to process PDF with AI.";
const QUIZ_FAILED: &str = "Failed to generate quiz from AI.";
const ANALYSIS_FAILED: &str = "Failed to get analysis from AI.";

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub documents: DocumentStore,
    pub max_upload_bytes: usize,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Unwrap a JSON body, turning axum's rejection into a caller-input error
fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    operation: &str,
) -> Result<T, (StatusCode, Json<ErrorResponse>)> {
    body.map(|Json(value)| value).map_err(|rejection| {
        QuizError::CallerInput(format!("Invalid request body: {}", rejection.body_text()))
            .to_response_with_context(ErrorContext::new(operation))
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            success: false,
            error,
            details: None,
        }
    }

    pub fn with_details(error: String, details: String) -> Self {
        Self {
            success: false,
            error,
            details: Some(details),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub topics: Vec<Topic>,
    pub uploaded_file_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub topic: Option<String>,
    pub question_count: Option<Value>, // number or numeric string
    pub uploaded_file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub quiz: Quiz,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub wrong_answers: Option<Vec<WrongAnswerRecord>>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
}

/// Accept a PDF, store it, and return the topics the model finds in it.
///
/// The stored document is removed again if anything after the save fails.
pub async fn upload_and_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let operation = "upload_and_analyze";
    log_api_start!(operation);

    let (file_name, bytes) = read_upload(multipart)
        .await
        .map_err(|e| e.to_response_with_context(ErrorContext::new(operation)))?;

    let handle = state
        .documents
        .save(file_name.as_deref(), &bytes)
        .await
        .map_err(|e| {
            e.to_response_with_context(ErrorContext::new(operation).with_user_message(UPLOAD_FAILED))
        })?;

    match state.quiz_service.extract_topics(&bytes).await {
        Ok(topics) => {
            log_api_success!(operation, count = topics.len(), "topics extracted");
            Ok(Json(UploadResponse {
                success: true,
                topics,
                uploaded_file_name: handle.to_string(),
            }))
        }
        Err(e) => {
            discard_document(&state.documents, &handle, operation).await;
            Err(e.to_response_with_context(
                ErrorContext::new(operation)
                    .with_handle(handle.as_str())
                    .with_user_message(UPLOAD_FAILED),
            ))
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Vec<u8>), QuizError> {
    let empty = || QuizError::CallerInput("File is empty.".to_string());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| QuizError::CallerInput(format!("Failed to parse multipart data: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| QuizError::CallerInput(format!("Failed to read uploaded file: {}", e)))?;

        if bytes.is_empty() {
            return Err(empty());
        }
        return Ok((file_name, bytes.to_vec()));
    }

    Err(empty())
}

/// Generate a quiz from a previously uploaded document.
///
/// Once the parameters are valid the document is deleted after the attempt,
/// whether or not it succeeded.
pub async fn generate_quiz(
    State(state): State<AppState>,
    body: Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> ApiResult<QuizResponse> {
    let operation = "generate_quiz";
    let request = json_body(body, operation)?;

    let (topic, question_count, handle) = validate_quiz_request(request)
        .map_err(|e| e.to_response_with_context(ErrorContext::new(operation)))?;
    log_api_start!(operation, handle = handle);

    let outcome = async {
        let document = state.documents.read(&handle).await?;
        state
            .quiz_service
            .generate_quiz(&document, &topic, question_count)
            .await
    }
    .await;

    discard_document(&state.documents, &handle, operation).await;

    match outcome {
        Ok(quiz) => {
            log_api_success!(operation, handle = handle, "quiz generated");
            Ok(Json(QuizResponse {
                success: true,
                quiz,
            }))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new(operation)
                .with_handle(handle.as_str())
                .with_user_message(QUIZ_FAILED),
        )),
    }
}

fn validate_quiz_request(
    request: GenerateQuizRequest,
) -> Result<(String, QuestionCount, DocumentHandle), QuizError> {
    let topic = request.topic.filter(|topic| !topic.trim().is_empty());
    let count = request.question_count.filter(|count| !count.is_null());

    let (Some(topic), Some(count), Some(file_name)) = (topic, count, request.uploaded_file_name)
    else {
        return Err(QuizError::CallerInput("Missing required parameters.".to_string()));
    };

    let question_count = QuestionCount::from_json(&count)?;
    let handle = DocumentHandle::parse(&file_name)?;
    Ok((topic, question_count, handle))
}

pub async fn analyze_weak_areas(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<AnalysisResponse> {
    let operation = "analyze_weak_areas";
    let request = json_body(body, operation)?;
    log_api_start!(operation);

    let wrong_answers = request.wrong_answers.unwrap_or_default();
    match state.quiz_service.analyze_weak_areas(&wrong_answers).await {
        Ok(analysis) => {
            log_api_success!(operation, count = wrong_answers.len(), "analysis returned");
            Ok(Json(AnalysisResponse { analysis }))
        }
        Err(e) => Err(e.to_response_with_context(
            ErrorContext::new(operation).with_user_message(ANALYSIS_FAILED),
        )),
    }
}

/// Best-effort removal; a failed delete is logged and never changes the response
async fn discard_document(documents: &DocumentStore, handle: &DocumentHandle, operation: &str) {
    if let Err(e) = documents.remove(handle).await {
        log_api_warn!(operation, handle = handle, error = e, "failed to clean up document");
    }
}

pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;

    Router::new()
        .route("/api/upload-and-analyze", post(upload_and_analyze))
        .route("/api/generate-quiz", post(generate_quiz))
        .route("/api/analyze-weak-areas", post(analyze_weak_areas))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}
