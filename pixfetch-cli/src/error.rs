//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use pixfetch::config::ConfigFileError;
use pixfetch::dispatcher::DispatcherError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read or write the config file
    ConfigFile(ConfigFileError),
    /// Failed to start the dispatcher
    DispatcherCreation(DispatcherError),
    /// Some requested images could not be fetched
    Fetch { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) = self {
            eprintln!();
            eprintln!("Run 'pixfetch config show' to see the effective settings,");
            eprintln!("or 'pixfetch config init --force' to start from defaults.");
        }

        process::exit(match self {
            CliError::Fetch { .. } => 2,
            _ => 1,
        })
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::DispatcherCreation(e) => write!(f, "Failed to start dispatcher: {}", e),
            CliError::Fetch { failed, total } => {
                write!(f, "{} of {} images could not be fetched", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::DispatcherCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<DispatcherError> for CliError {
    fn from(e: DispatcherError) -> Self {
        CliError::DispatcherCreation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = CliError::Fetch {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 images could not be fetched");
    }

    #[test]
    fn test_config_file_error_has_source() {
        let err = CliError::from(ConfigFileError::WriteError("disk full".to_string()));
        assert!(std::error::Error::source(&err).is_some());
    }
}
