use std::time::Instant;
use tracing::debug;

use crate::errors::QuizError;
use crate::llm_providers::{ChatProvider, GeminiProvider};
use crate::models::{QuestionCount, Quiz, Topic, WrongAnswerRecord};
use crate::prompts::{build_analysis_request, build_quiz_request, build_topics_request};
use crate::response_parser::JsonResponseParser;
use crate::{log_service_error, log_service_start, log_service_success, log_validation};

pub const NO_WRONG_ANSWERS_MESSAGE: &str = "No wrong answers to analyze. Keep up the great work!";

const SERVICE: &str = "quiz_service";

/// The three pipelines: prompt, one provider call, normalize, parse.
///
/// Storage is the caller's concern; nothing here reads or deletes documents.
#[derive(Debug, Clone)]
pub struct QuizService {
    gemini: GeminiProvider,
    chat: ChatProvider,
}

impl QuizService {
    pub fn new(gemini: GeminiProvider, chat: ChatProvider) -> Self {
        Self { gemini, chat }
    }

    pub async fn extract_topics(&self, document: &[u8]) -> Result<Vec<Topic>, QuizError> {
        let operation = "extract_topics";
        log_service_start!(SERVICE, operation);
        let started = Instant::now();

        let request = build_topics_request(document);
        let result = async {
            let text = self.gemini.generate(operation, &request).await?;
            debug!(operation, response_content = %text, "Raw model output for topics");
            JsonResponseParser::parse_json_response::<Vec<Topic>>(&text)
        }
        .await;

        match result {
            Ok(topics) => {
                log_service_success!(
                    SERVICE,
                    operation,
                    count = topics.len(),
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(topics)
            }
            Err(e) => {
                log_service_error!(SERVICE, operation, error = e);
                Err(e)
            }
        }
    }

    pub async fn generate_quiz(
        &self,
        document: &[u8],
        topic: &str,
        question_count: QuestionCount,
    ) -> Result<Quiz, QuizError> {
        let operation = "generate_quiz";
        log_service_start!(SERVICE, operation, count = question_count.get());
        let started = Instant::now();

        let request = build_quiz_request(document, topic, question_count);
        let result = async {
            let text = self.gemini.generate(operation, &request).await?;
            debug!(operation, topic, response_content = %text, "Raw model output for quiz");

            let quiz = JsonResponseParser::parse_json_response::<Quiz>(&text)?;
            quiz.validate().map_err(|message| {
                log_validation!(failure, "quiz", error = message);
                QuizError::ResponseParse {
                    message,
                    text: JsonResponseParser::normalize(&text),
                }
            })?;
            Ok::<_, QuizError>(quiz)
        }
        .await;

        match result {
            Ok(quiz) => {
                log_service_success!(
                    SERVICE,
                    operation,
                    count = quiz.questions.len(),
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(quiz)
            }
            Err(e) => {
                log_service_error!(SERVICE, operation, error = e);
                Err(e)
            }
        }
    }

    /// Free-text tutoring summary; an empty list never reaches the provider
    pub async fn analyze_weak_areas(&self, wrong_answers: &[WrongAnswerRecord]) -> Result<String, QuizError> {
        let operation = "analyze_weak_areas";
        if wrong_answers.is_empty() {
            log_service_success!(SERVICE, operation, "no wrong answers, skipping provider call");
            return Ok(NO_WRONG_ANSWERS_MESSAGE.to_string());
        }

        log_service_start!(SERVICE, operation, count = wrong_answers.len());
        let started = Instant::now();

        let request = build_analysis_request(self.chat.model_name(), wrong_answers);
        match self.chat.complete(operation, &request).await {
            Ok(analysis) => {
                log_service_success!(
                    SERVICE,
                    operation,
                    count = wrong_answers.len(),
                    duration_ms = started.elapsed().as_millis() as u64
                );
                Ok(analysis)
            }
            Err(e) => {
                log_service_error!(SERVICE, operation, error = e);
                Err(e)
            }
        }
    }

    pub fn gemini(&self) -> &GeminiProvider {
        &self.gemini
    }

    pub fn chat(&self) -> &ChatProvider {
        &self.chat
    }
}
