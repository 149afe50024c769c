//! Error types for sift-query.

use miette::Diagnostic;
use thiserror::Error;

/// Error type for query building and execution.
#[derive(Error, Diagnostic, Debug)]
pub enum QueryError {
    #[error("Unknown entity: {0}")]
    #[diagnostic(
        code(sift_query::unknown_entity),
        help("Declare the entity in the schema before building queries for it")
    )]
    UnknownEntity(String),

    #[error("Entity `{entity}` has no relation named `{relation}`")]
    #[diagnostic(
        code(sift_query::unknown_relation),
        help("Check the relation declarations of the entity")
    )]
    UnknownRelation { entity: String, relation: String },

    #[error("Duplicate entity: {0}")]
    #[diagnostic(
        code(sift_query::duplicate_entity),
        help("Each entity must have a unique name")
    )]
    DuplicateEntity(String),

    #[error("Invalid identifier: `{0}`")]
    #[diagnostic(
        code(sift_query::invalid_identifier),
        help("Identifiers may only contain letters, digits and underscores, and must not start with a digit")
    )]
    InvalidIdentifier(String),

    #[error("Database connection failed: {0}")]
    #[diagnostic(
        code(sift_query::connection),
        help("Check if the database file exists and is accessible")
    )]
    ConnectionError(String),

    #[error("Database query failed: {0}")]
    #[diagnostic(
        code(sift_query::query),
        help("Inspect the generated SQL with `sift sql` to see what was sent")
    )]
    QueryFailed(String),
}

impl From<diesel::result::Error> for QueryError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(_, info) => {
                QueryError::QueryFailed(info.message().to_string())
            }
            other => QueryError::QueryFailed(other.to_string()),
        }
    }
}

impl From<diesel::result::ConnectionError> for QueryError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        QueryError::ConnectionError(err.to_string())
    }
}

/// Result type alias for sift-query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
