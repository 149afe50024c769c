//! Operator nodes built by the [`Expression`] methods.

use crate::{traits::Expression, value::Value};

/// `left <op> ?`
pub struct BinaryOp<L> {
    left: L,
    op: &'static str,
    right: Value,
}

impl<L> BinaryOp<L> {
    pub fn new(left: L, op: &'static str, right: Value) -> Self {
        Self { left, op, right }
    }
}

impl<L: Expression> Expression for BinaryOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        params.push(self.right.clone());
        format!("{} {} ?", left_sql, self.op)
    }
}

/// `left LIKE ?`, optionally lowered on both sides.
pub struct LikeOp<L> {
    left: L,
    pattern: String,
    case_insensitive: bool,
}

impl<L> LikeOp<L> {
    pub const fn new(left: L, pattern: String, case_insensitive: bool) -> Self {
        Self {
            left,
            pattern,
            case_insensitive,
        }
    }
}

impl<L: Expression> Expression for LikeOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        params.push(format!("%{}%", self.pattern).into());
        if self.case_insensitive {
            format!("LOWER({}) LIKE LOWER(?)", left_sql)
        } else {
            format!("{} LIKE ?", left_sql)
        }
    }
}

/// `left [NOT] IN (?, ...)`
pub struct InOp<L> {
    left: L,
    values: Vec<Value>,
    negated: bool,
}

impl<L> InOp<L> {
    pub fn new(left: L, values: Vec<Value>, negated: bool) -> Self {
        Self {
            left,
            values,
            negated,
        }
    }
}

impl<L: Expression> Expression for InOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        // `x IN ()` is a syntax error in SQLite; an empty set never matches.
        if self.values.is_empty() {
            return if self.negated { "1 = 1" } else { "1 = 0" }.to_string();
        }
        let left_sql = self.left.to_sql(params);
        let placeholders = vec!["?"; self.values.len()].join(", ");
        params.extend(self.values.iter().cloned());
        let op = if self.negated { "NOT IN" } else { "IN" };
        format!("{} {} ({})", left_sql, op, placeholders)
    }
}

/// `left IS [NOT] NULL`
pub struct NullOp<L> {
    left: L,
    is_null: bool,
}

impl<L> NullOp<L> {
    pub fn new(left: L, is_null: bool) -> Self {
        Self { left, is_null }
    }
}

impl<L: Expression> Expression for NullOp<L> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        let op = if self.is_null {
            "IS NULL"
        } else {
            "IS NOT NULL"
        };
        format!("{} {}", left_sql, op)
    }
}

/// Two expressions joined by `AND` or `OR`.
pub struct LogicalOp<L, R> {
    left: L,
    right: R,
    op: &'static str,
}

impl<L, R> LogicalOp<L, R> {
    pub fn new(left: L, right: R, op: &'static str) -> Self {
        Self { left, right, op }
    }
}

impl<L: Expression, R: Expression> Expression for LogicalOp<L, R> {
    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        let left_sql = self.left.to_sql(params);
        let right_sql = self.right.to_sql(params);
        format!("({} {} {})", left_sql, self.op, right_sql)
    }
}
