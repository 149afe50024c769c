//! The query builder.
//!
//! [`SelectQuery`] is the only statement type: filters narrow a SELECT over
//! one entity, optionally joining related tables or correlating them through
//! `EXISTS` sub-queries.
//!
//! # Submodules
//!
//! - [`clause`]: JOIN / WHERE / ORDER BY clause representations.
//! - [`select`]: implementation of [`SelectQuery`].

pub mod clause;
pub mod select;

pub use clause::{JoinClause, JoinKind};
pub use select::SelectQuery;
