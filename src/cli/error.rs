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

    #[error("script stopped at line {line}: {message}")]
    ScriptFailed { line: usize, message: String },
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::ScriptFailed { .. } => crate::exitcode::FAILURE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::CANTCREAT,
                    ApplicationError::Domain(DomainError::Inconsistent(_)) => {
                        crate::exitcode::SOFTWARE
                    }
                    ApplicationError::Domain(_) => crate::exitcode::DATAERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_config_error_then_exit_code_is_config() {
        let err: CliError = ApplicationError::Config {
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }

    #[test]
    fn given_domain_error_then_exit_code_is_dataerr() {
        let err: CliError = ApplicationError::from(DomainError::EmptyNetwork).into();
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(err.to_string(), "network is empty");
    }

    #[test]
    fn given_failed_script_then_exit_code_is_failure() {
        let err = CliError::ScriptFailed {
            line: 3,
            message: "user not found: Zoe".to_string(),
        };
        assert_eq!(err.exit_code(), crate::exitcode::FAILURE);
        assert_eq!(
            err.to_string(),
            "script stopped at line 3: user not found: Zoe"
        );
    }
}
