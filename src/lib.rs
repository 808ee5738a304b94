pub mod api;
pub mod config;
pub mod document_store;
pub mod errors;
pub mod key_rotator;
pub mod llm_providers;
pub mod logging;
pub mod models;
pub mod prompts;
pub mod quiz_service;
pub mod response_parser;

pub use config::Config;
pub use document_store::{DocumentHandle, DocumentStore};
pub use errors::*;
pub use key_rotator::KeyRotator;
pub use llm_providers::{ChatProvider, ClientIdentity, GeminiProvider};
pub use models::*;
pub use quiz_service::QuizService;
pub use response_parser::JsonResponseParser;
