//! What a query builder has to offer for filters to run against it.

use sift_query::SelectQuery;

use crate::{error::Result, naming::FilterOptions};

/// The entity and table a relation leads to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedEntity {
    pub entity: String,
    pub table: String,
}

/// Capabilities a query needs for relation filtering. Filter methods
/// themselves call whatever the concrete query type offers.
pub trait FilterableQuery: Sized {
    /// Tables currently joined into the query.
    fn joined_tables(&self) -> Vec<String>;

    /// Resolves `relation` on the query's entity.
    fn related(&self, relation: &str) -> Result<RelatedEntity>;

    /// Adds an existence check over `relation`, narrowed by `constrain`
    /// against the sub-query.
    fn where_has<F>(&mut self, relation: &str, constrain: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>;
}

impl FilterableQuery for SelectQuery {
    fn joined_tables(&self) -> Vec<String> {
        SelectQuery::joined_tables(self)
    }

    fn related(&self, relation: &str) -> Result<RelatedEntity> {
        let (_, related) = self.schema().relation(self.entity(), relation)?;
        Ok(RelatedEntity {
            entity: related.name.clone(),
            table: related.table.clone(),
        })
    }

    fn where_has<F>(&mut self, relation: &str, constrain: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        SelectQuery::where_has(self, relation, constrain)
    }
}

/// Pagination that falls back to the configured page size.
pub trait Paginate {
    fn paginate(&mut self, page: u32, per_page: Option<u32>, options: &FilterOptions)
        -> &mut Self;
}

impl Paginate for SelectQuery {
    fn paginate(
        &mut self,
        page: u32,
        per_page: Option<u32>,
        options: &FilterOptions,
    ) -> &mut Self {
        let per_page = per_page
            .filter(|n| *n > 0)
            .unwrap_or(options.paginate_limit);
        self.page(page, per_page)
    }
}
