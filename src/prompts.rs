//! Request payloads for each pipeline step.
//!
//! Everything here is pure: the builders only shape data and never touch the
//! network, so prompt wording can be checked directly in unit tests.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::llm_providers::{ChatMessage, ChatRequest, GeminiContent, GeminiPart, GeminiRequest, InlineData};
use crate::models::{QuestionCount, WrongAnswerRecord};

pub const DOCUMENT_MIME_TYPE: &str = "application/pdf";

pub const TOPICS_INSTRUCTION: &str = "Analyze the content of the provided PDF document. \
Identify up to 10 main topics. For each topic, provide a concise 'title' and a one-sentence 'description'. \
Return the output as a valid JSON array of objects only. \
Do not include any text, backticks, or markdown formatting outside the JSON array.";

pub fn quiz_instruction(topic: &str, question_count: QuestionCount) -> String {
    format!(
        "You are an expert Quiz Generator. Use the provided document to create a quiz about the specific topic: \"{}\". \
Generate exactly {} multiple-choice questions. For each question, provide: a unique 'id' (string), \
the 'question' text (string), an array of exactly 4 'options' (strings), the index (0-3) of the 'correctAnswer' (number), \
and a concise 'explanation' (string). Return the output as a single, valid JSON object with one key: 'questions'. \
When a question is taken from an image inside the document, do not miss any data from that image. \
Do not include markdown.",
        topic,
        question_count.get()
    )
}

pub fn analysis_instruction(records_json: &str) -> String {
    format!(
        "You are a helpful academic tutor. A student has provided a list of quiz questions they answered incorrectly. \
Analyze this data to identify 1-3 key themes or weak areas. \
Provide a concise, encouraging, and actionable summary to help the student know what to study next. \
Address the user directly.\n\nHere is the data:\n{}",
        records_json
    )
}

fn document_request(document: &[u8], instruction: String) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![
                GeminiPart::Text { text: instruction },
                GeminiPart::InlineData {
                    inline_data: InlineData {
                        mime_type: DOCUMENT_MIME_TYPE.to_string(),
                        data: BASE64.encode(document),
                    },
                },
            ],
        }],
    }
}

pub fn build_topics_request(document: &[u8]) -> GeminiRequest {
    document_request(document, TOPICS_INSTRUCTION.to_string())
}

pub fn build_quiz_request(document: &[u8], topic: &str, question_count: QuestionCount) -> GeminiRequest {
    document_request(document, quiz_instruction(topic, question_count))
}

pub fn build_analysis_request(model: &str, wrong_answers: &[WrongAnswerRecord]) -> ChatRequest {
    // Serializing a list of JSON maps cannot fail
    let records_json = serde_json::to_string_pretty(wrong_answers).unwrap_or_default();

    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: analysis_instruction(&records_json),
        }],
    }
}
