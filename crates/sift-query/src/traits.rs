//! [`Expression`] is implemented by columns and by every operator node, so
//! conditions compose with method calls:
//! `posts::TITLE.like("rust").and(posts::ID.gt(3))`.

use crate::{
    expr::ops::{BinaryOp, InOp, LikeOp, LogicalOp, NullOp},
    value::Value,
};

/// A WHERE-clause fragment.
///
/// ```rust
/// use sift_query::expr::Col;
/// use sift_query::traits::Expression as _;
///
/// let mut params = vec![];
/// let sql = Col::<String>::new("users.name").eq("User").to_sql(&mut params);
/// assert_eq!(sql, "users.name = ?");
/// assert_eq!(params.len(), 1);
/// ```
pub trait Expression: Sized {
    /// Renders the fragment with `?` placeholders, pushing bound values to
    /// `params` in placeholder order.
    fn to_sql(&self, params: &mut Vec<Value>) -> String;

    fn eq<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "=", value.into())
    }

    fn ne<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "!=", value.into())
    }

    fn gt<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, ">", value.into())
    }

    fn lt<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "<", value.into())
    }

    fn gte<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, ">=", value.into())
    }

    fn lte<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "<=", value.into())
    }

    /// Substring match: the pattern is wrapped in `%`.
    fn like(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), false)
    }

    /// Case-insensitive substring match. SQLite has no `ILIKE`, so both
    /// sides are lowered.
    fn ilike(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), true)
    }

    /// An empty set never matches.
    fn in_<T, I>(self, values: I) -> InOp<Self>
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        InOp::new(self, values.into_iter().map(Into::into).collect(), false)
    }

    /// An empty set always matches.
    fn not_in<T, I>(self, values: I) -> InOp<Self>
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        InOp::new(self, values.into_iter().map(Into::into).collect(), true)
    }

    fn null(self) -> NullOp<Self> {
        NullOp::new(self, true)
    }

    fn not_null(self) -> NullOp<Self> {
        NullOp::new(self, false)
    }

    /// Parenthesized `(self AND other)`.
    fn and<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "AND")
    }

    /// Parenthesized `(self OR other)`.
    fn or<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "OR")
    }
}
