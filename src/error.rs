//! Error types for mentorgraph

use crate::model::{PersonId, Role};
use thiserror::Error;

/// Errors that can occur while fetching, syncing or editing the mentorship graph
#[derive(Error, Debug)]
pub enum MentorError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// I/O error (config files, marker files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The person is not part of the current dataset
    #[error("{role} {id} not found")]
    PersonNotFound { role: Role, id: PersonId },

    /// The collaborator refused a tag assignment
    #[error("Tag write rejected for {id}: {message}")]
    TagWriteRejected { id: PersonId, message: String },

    /// Generic fetch failure reported by a collaborator
    #[error("Fetch failed: {0}")]
    Fetch(String),
}

impl MentorError {
    /// Short message suitable for an inline, user-facing error banner
    pub fn user_message(&self) -> String {
        match self {
            MentorError::Http(e) if e.is_timeout() => "The server took too long to respond".to_string(),
            MentorError::Http(_) => "Could not reach the server".to_string(),
            MentorError::Status { status, .. } => format!("The server returned an error ({})", status),
            other => other.to_string(),
        }
    }
}

pub type MentorResult<T> = Result<T, MentorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MentorError::PersonNotFound {
            role: Role::Mentee,
            id: PersonId::new("e9"),
        };
        assert_eq!(err.to_string(), "mentee e9 not found");

        let err = MentorError::Status { status: 503, message: "down".into() };
        assert_eq!(err.user_message(), "The server returned an error (503)");
    }
}
