//! The SELECT query builder.

use std::{fmt, sync::Arc};

use tracing::trace;

use crate::{
    error::{QueryError, Result},
    expr::column::Col,
    query::clause::{JoinClause, JoinKind, OrderClause, WhereClause},
    schema::{validate_identifier, Schema},
    traits::Expression,
    value::Value,
};

/// An ergonomic SQL query builder for SQLite.
///
/// Constructed via [`SelectQuery::new`] for an entity of a [`Schema`], then
/// mutated with `.filter()`, `.join_relation()`, `.where_has()`, `.order_by()`, etc.
/// Every mutation takes `&mut self`, so a query can be handed to code that
/// narrows it in place.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sift_query::{define_entity, Entity, Schema, SelectQuery};
/// use sift_query::traits::Expression as _;
///
/// define_entity!(
///     users {
///         table: "users",
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name"
///         }
///     }
/// );
///
/// let schema = Arc::new(Schema::new().with(Entity::new("users", "users")).unwrap());
/// let mut query = SelectQuery::new(schema, "users").unwrap();
/// query
///     .filter(users::NAME.eq("Alice"))
///     .order_by(users::ID, false)
///     .limit(10);
///
/// let (sql, params) = query.to_sql();
/// assert_eq!(
///     sql,
///     "SELECT * FROM users WHERE users.name = ? ORDER BY users.id ASC LIMIT 10"
/// );
/// assert_eq!(params.len(), 1);
/// ```
pub struct SelectQuery {
    schema: Arc<Schema>,
    entity: String,
    table: String,
    columns: Vec<String>,
    joins: Vec<JoinClause>,
    wheres: Vec<WhereClause>,
    orders: Vec<OrderClause>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SelectQuery {
    /// Starts a new query on the table of `entity`.
    pub fn new(schema: Arc<Schema>, entity: &str) -> Result<Self> {
        let table = schema.entity(entity)?.table.clone();
        Ok(Self {
            schema,
            entity: entity.to_string(),
            table,
            columns: vec![],
            joins: vec![],
            wheres: vec![],
            orders: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Select specific columns from the table.
    pub fn select<T>(&mut self, cols: &[Col<T>]) -> &mut Self {
        self.columns.extend(cols.iter().map(|c| c.select_expr()));
        self
    }

    /// Select all columns from the table
    pub fn select_all(&mut self) -> &mut Self {
        self.columns.clear();
        self
    }

    /// Adds a JOIN clause.
    pub fn join(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        on: impl Into<String>,
    ) -> &mut Self {
        self.joins.push(JoinClause {
            kind,
            table: table.into(),
            on: on.into(),
        });
        self
    }

    /// Adds an `INNER JOIN` for a declared relation.
    pub fn join_relation(&mut self, relation: &str) -> Result<&mut Self> {
        self.join_relation_with(JoinKind::Inner, relation)
    }

    /// Adds a `LEFT JOIN` for a declared relation.
    pub fn left_join_relation(&mut self, relation: &str) -> Result<&mut Self> {
        self.join_relation_with(JoinKind::Left, relation)
    }

    fn join_relation_with(&mut self, kind: JoinKind, relation: &str) -> Result<&mut Self> {
        let (rel, related) = self.schema.relation(&self.entity, relation)?;
        let on = rel.correlation(&self.table, &related.table);
        let table = related.table.clone();
        Ok(self.join(kind, table, on))
    }

    /// Applies the WHERE condition.
    pub fn filter<Expr: Expression + 'static>(&mut self, expr: Expr) -> &mut Self {
        self.wheres
            .push(WhereClause::Expr(Box::new(move |params| expr.to_sql(params))));
        self
    }

    /// Adds `EXISTS (...)` over the rows of `relation` correlated with this
    /// query's rows. `constrain` narrows the sub-query before it is attached.
    ///
    /// The error type is the caller's, so closures can run code with their own
    /// error type as long as it absorbs [`QueryError`].
    pub fn where_has<F, E>(&mut self, relation: &str, constrain: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&mut SelectQuery) -> std::result::Result<(), E>,
        E: From<QueryError>,
    {
        let (rel, related) = self.schema.relation(&self.entity, relation)?;
        let correlation = rel.correlation(&self.table, &related.table);
        let related_entity = related.name.clone();

        let mut subquery = SelectQuery::new(self.schema.clone(), &related_entity)?;
        constrain(&mut subquery)?;

        trace!(
            "attaching EXISTS over `{}` with {} condition(s)",
            relation,
            subquery.wheres.len()
        );
        self.wheres.push(WhereClause::Exists {
            relation: relation.to_string(),
            correlation,
            subquery: Box::new(subquery),
        });
        Ok(())
    }

    /// Adds an ORDER BY clause.
    pub fn order_by<T>(&mut self, col: Col<T>, desc: bool) -> &mut Self {
        self.orders.push(OrderClause {
            column: col.name.to_string(),
            desc,
        });
        self
    }

    /// Adds an ORDER BY clause for a column named at runtime.
    pub fn order_by_name(&mut self, column: &str, desc: bool) -> Result<&mut Self> {
        for part in column.split('.') {
            validate_identifier(part)?;
        }
        self.orders.push(OrderClause {
            column: column.to_string(),
            desc,
        });
        Ok(self)
    }

    /// Limit the number of results
    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Set query offset
    pub fn offset(&mut self, offset: u32) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Set pagination params. Pages are 1-based; page 0 is treated as page 1.
    /// Offsets past `u32::MAX` are clamped.
    pub fn page(&mut self, page: u32, per_page: u32) -> &mut Self {
        self.limit = Some(per_page);
        self.offset = Some(page.saturating_sub(1).saturating_mul(per_page));
        self
    }

    /// Tables present in this query's JOIN clauses, in join order.
    pub fn joined_tables(&self) -> Vec<String> {
        self.joins.iter().map(|j| j.table.clone()).collect()
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Relations that were attached through [`SelectQuery::where_has`].
    pub fn exists_relations(&self) -> Vec<&str> {
        self.wheres
            .iter()
            .filter_map(|w| match w {
                WhereClause::Exists { relation, .. } => Some(relation.as_str()),
                WhereClause::Expr(_) => None,
            })
            .collect()
    }

    /// The sub-query attached for `relation`, if any.
    pub fn subquery(&self, relation: &str) -> Option<&SelectQuery> {
        self.wheres.iter().find_map(|w| match w {
            WhereClause::Exists {
                relation: r,
                subquery,
                ..
            } if r == relation => Some(subquery.as_ref()),
            _ => None,
        })
    }

    /// Number of top-level WHERE conditions, `EXISTS` clauses included.
    pub fn condition_count(&self) -> usize {
        self.wheres.len()
    }

    /// Renders the query into SQL and its bound parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut params = vec![];

        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut sql = format!("SELECT {} FROM {}", select, self.table);
        self.push_joins(&mut sql);
        self.push_conditions(&mut sql, None, &mut params);

        if !self.orders.is_empty() {
            sql.push_str(" ORDER BY ");
            let orders = self
                .orders
                .iter()
                .map(|o| format!("{} {}", o.column, if o.desc { "DESC" } else { "ASC" }))
                .collect::<Vec<_>>();
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            if self.limit.is_none() {
                sql.push_str(" LIMIT -1");
            }
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, params)
    }

    /// Renders `SELECT COUNT(*) AS count ...` ignoring order and pagination.
    pub fn to_count_sql(&self) -> (String, Vec<Value>) {
        let mut params = vec![];
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.table);
        self.push_joins(&mut sql);
        self.push_conditions(&mut sql, None, &mut params);
        (sql, params)
    }

    /// Renders the query with parameters inlined. For display only.
    pub fn to_debug_sql(&self) -> String {
        let (sql, params) = self.to_sql();
        let mut params = params.into_iter();
        let mut out = String::with_capacity(sql.len());
        for ch in sql.chars() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            match params.next() {
                Some(value) => out.push_str(&value.to_string()),
                None => out.push('?'),
            }
        }
        out
    }

    fn push_joins(&self, sql: &mut String) {
        for join in &self.joins {
            sql.push_str(&format!(" {}", join));
        }
    }

    fn push_conditions(&self, sql: &mut String, leading: Option<&str>, params: &mut Vec<Value>) {
        let mut conditions = Vec::with_capacity(self.wheres.len() + 1);
        if let Some(leading) = leading {
            conditions.push(leading.to_string());
        }
        for clause in &self.wheres {
            conditions.push(match clause {
                WhereClause::Expr(sql_fn) => sql_fn(params),
                WhereClause::Exists {
                    correlation,
                    subquery,
                    ..
                } => subquery.render_exists(correlation, params),
            });
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
    }

    fn render_exists(&self, correlation: &str, params: &mut Vec<Value>) -> String {
        let mut sql = format!("EXISTS (SELECT * FROM {}", self.table);
        self.push_joins(&mut sql);
        self.push_conditions(&mut sql, Some(correlation), params);
        sql.push(')');
        sql
    }
}

impl fmt::Debug for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sql, params) = self.to_sql();
        f.debug_struct("SelectQuery")
            .field("entity", &self.entity)
            .field("sql", &sql)
            .field("params", &params)
            .finish()
    }
}
