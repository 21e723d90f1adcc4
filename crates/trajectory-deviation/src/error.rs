use std::path::PathBuf;
use thiserror::Error;
use trajectory_deviation_lib::EngineError;

/// Errors that abort a command-line run
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: no header line found", path.display())]
    MissingHeader { path: PathBuf },

    #[error("{}: header has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}: {source}", path.display())]
    Engine { path: PathBuf, source: EngineError },

    #[error("Invalid configuration file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] EngineError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = CliError::MissingColumn {
            path: PathBuf::from("runs/lap1.txt"),
            column: "heading(rad)",
        };
        assert_eq!(
            err.to_string(),
            "runs/lap1.txt: header has no 'heading(rad)' column"
        );

        let err = CliError::Engine {
            path: PathBuf::from("ref.txt"),
            source: EngineError::InsufficientPoints {
                operation: "path construction",
                required: 2,
                actual: 1,
            },
        };
        assert_eq!(
            err.to_string(),
            "ref.txt: path construction needs at least 2 points, got 1"
        );
    }
}
