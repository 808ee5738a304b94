//! Shared fixtures for the integration suites: canned provider envelopes and
//! a `QuizService` wired against a wiremock upstream.
#![allow(dead_code)]

use quizmaster::llm_providers::build_http_client;
use quizmaster::{ChatProvider, ClientIdentity, GeminiProvider, KeyRotator, QuizService};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::MockServer;

pub const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
pub const CHAT_PATH: &str = "/api/v1/chat/completions";
pub const CHAT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const CHAT_KEY: &str = "sk-or-test";
pub const GEMINI_KEYS: [&str; 2] = ["gemini-key-one", "gemini-key-two"];

pub fn service(server: &MockServer) -> QuizService {
    service_with_timeout(server, Duration::from_secs(5))
}

pub fn service_with_timeout(server: &MockServer, timeout: Duration) -> QuizService {
    let client = build_http_client(timeout).unwrap();
    let keys = KeyRotator::new(GEMINI_KEYS.iter().map(|k| k.to_string()).collect()).unwrap();

    let gemini = GeminiProvider::new(client.clone(), format!("{}{}", server.uri(), GEMINI_PATH), keys);
    let chat = ChatProvider::new(
        client,
        format!("{}{}", server.uri(), CHAT_PATH),
        CHAT_KEY.to_string(),
        CHAT_MODEL.to_string(),
        ClientIdentity {
            referer: "http://localhost:3000".to_string(),
            title: "QuizMaster".to_string(),
        },
    );

    QuizService::new(gemini, chat)
}

pub fn gemini_envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

pub fn chat_envelope(text: &str) -> Value {
    json!({
        "id": "gen-123",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

pub fn fenced_topics() -> String {
    "```json\n[{\"title\":\"T\",\"description\":\"D\"}]\n```".to_string()
}

pub fn three_questions() -> Value {
    json!([
        {
            "id": "q1",
            "question": "What is x if 2x = 6?",
            "options": ["1", "2", "3", "6"],
            "correctAnswer": 2,
            "explanation": "Divide both sides by 2."
        },
        {
            "id": "q2",
            "question": "Which is a linear equation?",
            "options": ["y = x^2", "y = 2x + 1", "y = 1/x", "y = sqrt(x)"],
            "correctAnswer": 1,
            "explanation": "Degree one in x."
        },
        {
            "id": "q3",
            "question": "Solve x + 4 = 4.",
            "options": ["0", "4", "8", "-4"],
            "correctAnswer": 0,
            "explanation": "Subtract 4 from both sides."
        }
    ])
}

/// Questions as some models emit them: numeric ids, `correctAnswerIndex`, extra keys
pub fn indexed_questions() -> Value {
    json!([
        {
            "id": 1,
            "question": "What is 3 * 4?",
            "options": ["7", "12", "34", "1"],
            "correctAnswerIndex": 1,
            "explanation": "Three groups of four."
        },
        {
            "id": 2,
            "question": "What is 10 - 7?",
            "options": ["3", "17", "-3", "7"],
            "correctAnswerIndex": 0,
            "explanation": "Count down from ten.",
            "difficulty": "easy"
        }
    ])
}

pub fn quiz_text(questions: &Value) -> String {
    json!({ "questions": questions }).to_string()
}

/// Prompt text of the first Gemini part in a captured request body
pub fn gemini_prompt(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap();
    value["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .to_string()
}
