//! Classification of create failures.
//!
//! Creating an entity that already exists in the target scope is not a
//! failure: a replayed run must count it as moved. The platform reports
//! these with a dedicated code, but some endpoints only say so in the
//! message text.

use transplant_platform::{ErrorBody, PlatformError};

/// Error code the platform uses for a duplicate identifier.
pub const DUPLICATE_CODE: &str = "DUPLICATE_FIELD";

/// Message fragment some endpoints use instead of [`DUPLICATE_CODE`].
pub const DUPLICATE_MESSAGE: &str = "already exists";

/// How a failed create is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The entity is already present; counts as moved.
    BenignDuplicate,
    /// The entity was not created.
    Genuine,
}

/// Classify a failed create call from its status and error body.
pub fn classify(_status: u16, body: &ErrorBody) -> FailureClass {
    if body.code == DUPLICATE_CODE || body.message.contains(DUPLICATE_MESSAGE) {
        FailureClass::BenignDuplicate
    } else {
        FailureClass::Genuine
    }
}

/// Result of a single create attempt, after classification.
#[derive(Debug)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    /// Rejected by the platform; carries the single-line error text.
    Rejected(String),
    /// The request never got an answer.
    Transport(PlatformError),
}

impl CreateOutcome {
    /// Classify the result of a create call.
    pub fn from_result<T>(result: Result<T, PlatformError>) -> Self {
        let err = match result {
            Ok(_) => return CreateOutcome::Created,
            Err(err) if err.is_transport() => return CreateOutcome::Transport(err),
            Err(err) => err,
        };
        match err.api_body() {
            Some((status, body)) => match classify(status, body) {
                FailureClass::BenignDuplicate => CreateOutcome::AlreadyExists,
                FailureClass::Genuine => CreateOutcome::Rejected(body.summary()),
            },
            None => CreateOutcome::Rejected(transplant_platform::single_line(&err.to_string())),
        }
    }

    /// Whether the entity now exists in the target scope.
    pub fn is_moved(&self) -> bool {
        matches!(self, CreateOutcome::Created | CreateOutcome::AlreadyExists)
    }
}
