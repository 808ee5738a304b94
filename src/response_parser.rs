use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::errors::QuizError;

/// A fence marker. A language tag (```json) is only taken when it runs to the end of its line.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)```(?:[A-Za-z0-9_+-]+\r?$)?").expect("fence pattern is valid")
});

/// Cleans model output before it is handed to serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseParser;

impl JsonResponseParser {
    /// Remove every markdown fence marker wherever it occurs, then trim.
    ///
    /// Idempotent: the result never contains three consecutive backticks.
    pub fn normalize(raw: &str) -> String {
        FENCE.replace_all(raw, "").trim().to_string()
    }

    /// Normalize and parse; failures keep the cleaned text for diagnosis
    pub fn parse_json_response<T>(raw: &str) -> Result<T, QuizError>
    where
        T: DeserializeOwned,
    {
        let cleaned = Self::normalize(raw);
        serde_json::from_str::<T>(&cleaned).map_err(|e| QuizError::ResponseParse {
            message: e.to_string(),
            text: cleaned,
        })
    }
}
