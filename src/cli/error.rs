//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        Self::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::Infra(InfraError::from(e))
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Serialization { .. } => crate::exitcode::DATAERR,
                InfraError::Application(ApplicationError::Config { .. }) => crate::exitcode::CONFIG,
                InfraError::Application(ApplicationError::Domain(d)) => match d {
                    DomainError::NotFound { .. } => crate::exitcode::NOINPUT,
                    DomainError::Import { .. }
                    | DomainError::ExportFailure { .. }
                    | DomainError::Submission { .. } => crate::exitcode::DATAERR,
                    DomainError::DuplicateSlug { .. }
                    | DomainError::InvalidSlug { .. }
                    | DomainError::InvalidMove { .. }
                    | DomainError::RootSection { .. } => crate::exitcode::USAGE,
                },
                InfraError::Application(ApplicationError::OperationFailed { .. }) => {
                    crate::exitcode::SOFTWARE
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_not_found_when_mapping_exit_code_then_noinput() {
        let err = CliError::from(DomainError::section_not_found("x"));
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }

    #[test]
    fn given_import_error_when_mapping_exit_code_then_dataerr() {
        let err = CliError::from(DomainError::import("/a/", "bad slug"));
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }
}
