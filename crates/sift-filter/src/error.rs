use miette::Diagnostic;
use sift_query::QueryError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum FilterError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error("No filter registered for entity `{0}`")]
    #[diagnostic(
        code(sift_filter::missing_filter),
        help("Register a FilterDef for the entity or declare it under [[entities]]")
    )]
    MissingFilter(String),

    #[error("Method `{method}` not found on the `{entity}` filter")]
    #[diagnostic(code(sift_filter::method_not_found))]
    MethodNotFound { entity: String, method: String },

    #[error("Invalid filter input: {0}")]
    #[diagnostic(
        code(sift_filter::invalid_input),
        help("Input must be a JSON object or a URL query string")
    )]
    InvalidInput(String),

    #[error("{0}")]
    #[diagnostic(code(sift_filter::backend))]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FilterError {
    /// Wraps an error raised by a query backend other than `sift-query`.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        FilterError::Backend(err.into())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
