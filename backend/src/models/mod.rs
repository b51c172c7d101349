pub mod calendar;
pub mod duty;
pub mod exam;
pub mod macros;
pub mod room;
pub mod student;

pub use calendar::*;
pub use duty::*;
pub use exam::*;
pub use room::*;
pub use student::*;

use serde::{Deserialize, Serialize};

/// Scalar cell as it arrives from hand-made JSON or spreadsheet exports,
/// where `"3"` and `3` mean the same semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseText {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl LooseText {
    /// Trimmed textual form.
    pub fn normalized(&self) -> String {
        match self {
            LooseText::Text(s) => s.trim().to_string(),
            LooseText::Number(n) => n.to_string(),
            LooseText::Flag(b) => b.to_string(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LooseText::Text(s) => s.trim().parse().ok(),
            LooseText::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            LooseText::Flag(_) => None,
        }
    }
}

impl From<&str> for LooseText {
    fn from(s: &str) -> Self {
        LooseText::Text(s.to_string())
    }
}

impl From<i64> for LooseText {
    fn from(n: i64) -> Self {
        LooseText::Number(n.into())
    }
}

/// Normalized, non-empty text of an optional loose field.
pub(crate) fn required_text(field: &Option<LooseText>) -> Option<String> {
    field
        .as_ref()
        .map(LooseText::normalized)
        .filter(|s| !s.is_empty())
}

/// Reason an input record was rejected during normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl InputError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        InputError::Invalid {
            field,
            message: message.into(),
        }
    }
}
