use std::{collections::HashMap, fmt, sync::Arc};

use tracing::debug;

use crate::{
    definition::FilterDef,
    dispatcher::ModelFilter,
    error::{FilterError, Result},
    input::FilterInput,
    naming::FilterOptions,
    query::FilterableQuery,
};

/// Filters by entity name. Relation filtering looks up the related entity's
/// filter here.
pub struct FilterRegistry<Q> {
    filters: HashMap<String, Arc<FilterDef<Q>>>,
    options: FilterOptions,
}

impl<Q> Default for FilterRegistry<Q> {
    fn default() -> Self {
        Self {
            filters: HashMap::new(),
            options: FilterOptions::default(),
        }
    }
}

impl<Q> FilterRegistry<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FilterOptions) -> Self {
        Self {
            filters: HashMap::new(),
            options,
        }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Adds `def` under its entity name, returning the definition it replaced.
    pub fn register(&mut self, def: FilterDef<Q>) -> Option<Arc<FilterDef<Q>>> {
        debug!("registering filter for `{}`", def.entity());
        self.filters.insert(def.entity().to_string(), Arc::new(def))
    }

    pub fn get(&self, entity: &str) -> Result<Arc<FilterDef<Q>>> {
        self.filters
            .get(entity)
            .cloned()
            .ok_or_else(|| FilterError::MissingFilter(entity.to_string()))
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.filters.contains_key(entity)
    }

    /// Registered entity names, sorted.
    pub fn entities(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<Q: FilterableQuery> FilterRegistry<Q> {
    /// Runs the filter of `entity` over `query`.
    pub fn filter<'q>(
        &self,
        query: &'q mut Q,
        entity: &str,
        input: impl Into<FilterInput>,
    ) -> Result<&'q mut Q> {
        let def = self.get(entity)?;
        ModelFilter::new(&mut *query, input, def, self).handle()?;
        Ok(query)
    }
}

impl<Q> fmt::Debug for FilterRegistry<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("entities", &self.entities())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = FilterRegistry::<()>::new();
        assert!(registry.register(FilterDef::new("posts")).is_none());
        assert!(registry.register(FilterDef::new("comments")).is_none());
        assert!(registry.register(FilterDef::new("posts")).is_some());

        assert!(registry.contains("posts"));
        assert_eq!(registry.entities(), vec!["comments", "posts"]);
        assert_eq!(registry.get("posts").unwrap().entity(), "posts");
    }

    #[test]
    fn test_missing_filter() {
        let registry = FilterRegistry::<()>::new();
        assert!(matches!(
            registry.get("users"),
            Err(FilterError::MissingFilter(name)) if name == "users"
        ));
    }
}
