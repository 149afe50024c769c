//! Typed SQL query builder for sift.
//!
//! Columns ([`expr::Col`]) and operators build conditions, a [`Schema`] holds
//! entities and their relations, and [`SelectQuery`] renders SQLite SQL that
//! [`DbConnection`] can execute through diesel.

pub mod connection;
pub mod error;
pub mod expr;
pub mod macros;
pub mod query;
pub mod schema;
pub mod traits;
pub mod value;

pub use connection::DbConnection;
pub use error::{QueryError, Result};
pub use expr::Col;
pub use query::*;
pub use schema::{Entity, Relation, RelationKind, Schema};
pub use traits::Expression;
pub use value::Value;
