//! Represents a typed database column.
//!
//! `Col<T>` ties a column name to a Rust type `T`. It implements
//! [`Expression`], so it can be used directly in filters.

use std::{borrow::Cow, marker::PhantomData};

use crate::{traits::Expression, value::Value};

/// A typed reference to a database column.
///
/// Names are usually table-qualified (`posts.title`) so the same column can be
/// used both in a joined query and inside an `EXISTS` sub-query.
///
/// # Example
///
/// ```rust
/// use sift_query::expr::Col;
/// const NAME: Col<String> = Col::new("users.name");
/// ```
#[derive(Clone, Debug)]
pub struct Col<T> {
    pub name: Cow<'static, str>,
    pub is_json: bool,
    _type: PhantomData<T>,
}

impl<T> Col<T> {
    /// Creates a new column reference.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            is_json: false,
            _type: PhantomData,
        }
    }

    /// Mark this column as JSON for proper SELECT handling
    pub const fn json(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            is_json: true,
            _type: PhantomData,
        }
    }

    /// Column whose name is only known at runtime, e.g. from configuration.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            is_json: false,
            _type: PhantomData,
        }
    }

    /// Get the select expression for this column
    pub fn select_expr(&self) -> String {
        if self.is_json {
            let alias = self.name.rsplit('.').next().unwrap_or(&self.name);
            format!("json({}) AS {}", self.name, alias)
        } else {
            self.name.to_string()
        }
    }
}

impl<T> Expression for Col<T> {
    fn to_sql(&self, _params: &mut Vec<Value>) -> String {
        self.name.to_string()
    }
}
