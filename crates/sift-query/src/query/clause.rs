//! Internal representation of query clauses.
//!
//! Only [`JoinClause`] and [`JoinKind`] are part of the public API; the rest is
//! used by [`super::SelectQuery`] while rendering.

use std::fmt;

use crate::{query::select::SelectQuery, value::Value};

/// A WHERE condition.
pub(crate) enum WhereClause {
    /// A plain expression, rendered by a closure that also binds its parameters.
    Expr(Box<dyn Fn(&mut Vec<Value>) -> String>),
    /// `EXISTS (SELECT * FROM related WHERE correlation AND ...)`
    Exists {
        relation: String,
        correlation: String,
        subquery: Box<SelectQuery>,
    },
}

/// An ORDER BY clause.
pub(crate) struct OrderClause {
    pub column: String,
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub on: String,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ON {}", self.kind, self.table, self.on)
    }
}
