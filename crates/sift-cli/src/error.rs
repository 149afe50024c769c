use miette::Diagnostic;
use sift_config::error::ConfigError;
use sift_filter::FilterError;
use sift_query::QueryError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid JSON input: {0}")]
    #[diagnostic(
        code(sift::json),
        help("Pass a JSON object, e.g. '{{\"title\": \"rust\"}}', or drop --json")
    )]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(sift::io))]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
