use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::QuizError;

/// A topic as the model emitted it; fields beyond `title` and `description` are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One generated question, held exactly as the model emitted it.
///
/// Keys and value types pass through untouched; only the shape that matters
/// to the client is checked by [`Quiz::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizQuestion(pub Map<String, Value>);

impl QuizQuestion {
    /// Accepted spellings of the 0-based answer index, in lookup order
    pub const ANSWER_INDEX_FIELDS: [&'static str; 2] = ["correctAnswerIndex", "correctAnswer"];

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn options(&self) -> Option<&Vec<Value>> {
        self.0.get("options").and_then(Value::as_array)
    }

    pub fn correct_answer_index(&self) -> Option<&Value> {
        Self::ANSWER_INDEX_FIELDS
            .iter()
            .find_map(|field| self.0.get(*field))
    }

    fn label(&self, position: usize) -> String {
        match self.id() {
            Some(Value::String(id)) => format!("question '{}'", id),
            Some(id) => format!("question {}", id),
            None => format!("question #{}", position + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub const OPTION_COUNT: usize = 4;

    /// Check every question has exactly four string options and an in-range answer index
    pub fn validate(&self) -> Result<(), String> {
        for (position, question) in self.questions.iter().enumerate() {
            let label = question.label(position);

            let options = question
                .options()
                .ok_or_else(|| format!("{} has no options array", label))?;
            if options.len() != Self::OPTION_COUNT {
                return Err(format!(
                    "{} has {} options, expected {}",
                    label,
                    options.len(),
                    Self::OPTION_COUNT
                ));
            }
            if !options.iter().all(Value::is_string) {
                return Err(format!("{} has a non-string option", label));
            }

            let index = question
                .correct_answer_index()
                .ok_or_else(|| format!("{} has no correct answer index", label))?;
            match index.as_u64() {
                Some(i) if i < Self::OPTION_COUNT as u64 => {}
                _ => {
                    return Err(format!(
                        "{} has correct answer index {} outside 0-3",
                        label, index
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One incorrectly answered question as submitted by the client; forwarded verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrongAnswerRecord(pub Map<String, Value>);

/// Number of questions to generate; always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionCount(u32);

impl QuestionCount {
    pub fn new(count: u32) -> Result<Self, QuizError> {
        if count == 0 {
            return Err(QuizError::CallerInput(
                "questionCount must be a positive integer".to_string(),
            ));
        }
        Ok(Self(count))
    }

    /// Accept a JSON number or a numeric string, e.g. `5` or `"5"`
    pub fn from_json(value: &Value) -> Result<Self, QuizError> {
        let invalid = || {
            QuizError::CallerInput(format!(
                "questionCount must be a positive integer, got {}",
                value
            ))
        };

        let count = match value {
            Value::Number(number) => number.as_u64().ok_or_else(invalid)?,
            Value::String(text) => text.trim().parse::<u64>().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        let count = u32::try_from(count).map_err(|_| invalid())?;
        Self::new(count).map_err(|_| invalid())
    }

    pub fn get(self) -> u32 {
        self.0
    }
}
