//! SQLite execution of rendered queries.
//!
//! Queries are rendered to SQL with `?` placeholders and executed through
//! diesel's untyped `sql_query`, binding each [`Value`] with its SQL type.

use std::path::Path;

use diesel::{
    connection::SimpleConnection,
    query_builder::{BoxedSqlQuery, SqlQuery},
    sql_query,
    sql_types::{BigInt, Bool, Double, Nullable, Text},
    sqlite::Sqlite,
    Connection, QueryableByName, RunQueryDsl, SqliteConnection,
};
use tracing::debug;

use crate::{error::Result, query::SelectQuery, value::Value};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Database connection wrapper used to run [`SelectQuery`] values.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens the SQLite database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let conn = SqliteConnection::establish(&path_str)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = SqliteConnection::establish(":memory:")?;
        Ok(Self { conn })
    }

    /// Runs raw SQL statements, e.g. schema setup. Statements are separated by `;`.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.batch_execute(sql)?;
        Ok(())
    }

    /// Loads every row the query selects.
    pub fn fetch<T>(&mut self, query: &SelectQuery) -> Result<Vec<T>>
    where
        T: QueryableByName<Sqlite> + 'static,
    {
        let (sql, params) = query.to_sql();
        debug!("fetch: {}", sql);
        Ok(bind_all(&sql, params).load::<T>(&mut self.conn)?)
    }

    /// Loads the first row the query selects, if any.
    pub fn fetch_one<T>(&mut self, query: &mut SelectQuery) -> Result<Option<T>>
    where
        T: QueryableByName<Sqlite> + 'static,
    {
        query.limit(1);
        let mut results = self.fetch(query)?;
        Ok(results.pop())
    }

    /// Counts the rows the query selects, ignoring pagination.
    pub fn count(&mut self, query: &SelectQuery) -> Result<i64> {
        let (sql, params) = query.to_count_sql();
        debug!("count: {}", sql);
        let row = bind_all(&sql, params).get_result::<CountRow>(&mut self.conn)?;
        Ok(row.count)
    }
}

fn bind_all(sql: &str, params: Vec<Value>) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
    let mut query = sql_query(sql).into_boxed::<Sqlite>();
    for value in params {
        query = match value {
            Value::Null => query.bind::<Nullable<Text>, _>(None::<String>),
            Value::Bool(b) => query.bind::<Bool, _>(b),
            Value::Integer(i) => query.bind::<BigInt, _>(i),
            Value::Real(r) => query.bind::<Double, _>(r),
            Value::Text(s) => query.bind::<Text, _>(s),
        };
    }
    query
}
