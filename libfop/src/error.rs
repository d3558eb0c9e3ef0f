//! Error types for the field-of-play runtime

use thiserror::Error;

use crate::types::AthleteId;

pub type Result<T> = std::result::Result<T, FopError>;

#[derive(Error, Debug)]
pub enum FopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Platform already registered: {0}")]
    DuplicatePlatform(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FopError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FopError::InvalidInput(_) => 3,
            FopError::Config(_) => 2,
            FopError::Repository(_) => 1,
            FopError::UnknownPlatform(_) => 1,
            FopError::DuplicatePlatform(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Failures reported by an [`AthleteRepository`](crate::repository::AthleteRepository).
///
/// A failure while recording a decision is never retried by the runtime;
/// it is surfaced to the operator instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Unknown athlete: {0}")]
    UnknownAthlete(AthleteId),

    #[error("Athlete {0} has no attempt left")]
    NoAttemptLeft(AthleteId),

    #[error("Athlete {0} has no judged attempt to amend")]
    NothingToAmend(AthleteId),

    #[error("Storage failure: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = FopError::InvalidInput("empty command".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = FopError::Config(ConfigError::MissingField("platforms".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_repository_error() {
        let error = FopError::Repository(RepositoryError::Storage("disk full".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_platform_errors() {
        assert_eq!(FopError::UnknownPlatform("B".to_string()).exit_code(), 1);
        assert_eq!(FopError::DuplicatePlatform("A".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_config() {
        let error = FopError::Config(ConfigError::Invalid("bus.capacity must be > 0".to_string()));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Invalid value: bus.capacity must be > 0"
        );
    }

    #[test]
    fn test_error_message_formatting_repository() {
        let id = AthleteId::new();
        let error = FopError::Repository(RepositoryError::NoAttemptLeft(id));
        assert_eq!(
            format!("{}", error),
            format!("Repository error: Athlete {} has no attempt left", id)
        );
    }

    #[test]
    fn test_error_conversion_from_repository_error() {
        let repo_error = RepositoryError::Storage("locked".to_string());
        let fop_error: FopError = repo_error.into();

        match fop_error {
            FopError::Repository(RepositoryError::Storage(msg)) => assert_eq!(msg, "locked"),
            _ => panic!("Expected FopError::Repository"),
        }
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_error: ConfigError = io_error.into();
        let fop_error: FopError = config_error.into();

        assert!(matches!(fop_error, FopError::Config(ConfigError::ReadError(_))));
    }
}
