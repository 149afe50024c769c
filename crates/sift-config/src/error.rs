use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(sift_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(sift_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(sift_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Duplicate entity name: {0}")]
    #[diagnostic(
        code(sift_config::duplicate_entity),
        help("Each entity must have a unique name")
    )]
    DuplicateEntityName(String),

    #[error("Relation `{relation}` of entity `{entity}` points at unknown entity `{target}`")]
    #[diagnostic(
        code(sift_config::unknown_relation_target),
        help("Declare the target entity under [[entities]] or fix the relation's `entity` key")
    )]
    UnknownRelationTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("Invalid paginate_limit: must be greater than zero")]
    #[diagnostic(code(sift_config::invalid_paginate_limit))]
    InvalidPaginateLimit,

    #[error("IO error: {0}")]
    #[diagnostic(code(sift_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(sift_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(sift_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),

    #[error("Failed to annotate first table in array: {0}")]
    #[diagnostic(code(sift_config::annotate_first_table))]
    AnnotateFirstTable(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
