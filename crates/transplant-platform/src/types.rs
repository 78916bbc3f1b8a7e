//! Wire-level types shared by every call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An organization+project pair on the platform.
///
/// Scopes are values: they are read and used as lookup keys, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Organization identifier.
    pub org: String,
    /// Project identifier.
    pub project: String,
}

impl Scope {
    /// Create a scope from an organization and project identifier.
    pub fn new(org: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            project: project.into(),
        }
    }

    /// The `orgIdentifier`/`projectIdentifier` query pair for this scope.
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("orgIdentifier", self.org.clone()),
            ("projectIdentifier", self.project.clone()),
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.project)
    }
}

/// Error body returned by the platform on failed calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "correlationId")]
    pub correlation_id: String,
}

impl ErrorBody {
    /// Build a body for a response that was not valid JSON.
    pub fn from_text(text: &str) -> Self {
        Self {
            message: text.to_string(),
            ..Self::default()
        }
    }

    /// `code: message` on a single line, suitable for log fields.
    pub fn summary(&self) -> String {
        if self.code.is_empty() {
            single_line(&self.message)
        } else {
            format!("{}: {}", self.code, single_line(&self.message))
        }
    }
}

/// Strip embedded newlines so error text stays on one log line.
pub fn single_line(text: &str) -> String {
    text.replace(|c: char| c == '\r' || c == '\n', "")
}
