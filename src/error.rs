use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("no configurations found, please add one")]
    EmptyCatalog,

    #[error("{0}")]
    Validation(String),

    #[error("missing required binaries in PATH: {0}")]
    MissingBinary(String),

    #[error("command failed ({status}): {command}{}", fmt_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

fn fmt_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}
