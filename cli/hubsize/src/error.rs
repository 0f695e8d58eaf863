//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{what} not found at {path:?}")]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("Could not parse {what} at {path:?}: {message}")]
    CorruptInput {
        what: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Registry client error: {0}")]
    Registry(#[from] hubsize_registry::FetchError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::MissingInput { .. } => {
                eprintln!(
                    "\n{}",
                    "Hint: Pass --entities or set entities_path in config.json. Nothing was written."
                        .yellow()
                );
            }
            CliError::CorruptInput { path, .. } => {
                eprintln!(
                    "\n{}",
                    format!("Hint: Fix or remove {:?} and run again.", path).yellow()
                );
            }
            CliError::Registry(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check --registry-url and --repository.".yellow()
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message_names_path() {
        let err = CliError::MissingInput {
            what: "Expected entities file",
            path: PathBuf::from("public/data/games.json"),
        };
        assert_eq!(
            err.to_string(),
            "Expected entities file not found at \"public/data/games.json\""
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = CliError::MissingInput {
            what: "Expected entities file",
            path: PathBuf::from("games.json"),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingInput { .. })
        ));
    }
}
