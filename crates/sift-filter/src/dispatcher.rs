//! The filter dispatcher.
//!
//! [`ModelFilter`] walks the request input, calls the filter method each key
//! names and then cascades the remaining relation fields into the related
//! entities' filters. A relation whose table is already joined is filtered on
//! the same query; any other relation gets an `EXISTS` sub-query.

use std::{cell::OnceCell, collections::HashSet, sync::Arc};

use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    definition::FilterDef,
    error::{FilterError, Result},
    input::FilterInput,
    naming::{handler_key, FilterOptions},
    query::FilterableQuery,
    registry::FilterRegistry,
};

pub struct ModelFilter<'q, 'r, Q: FilterableQuery> {
    query: &'q mut Q,
    input: FilterInput,
    def: Arc<FilterDef<Q>>,
    registry: &'r FilterRegistry<Q>,
    options: FilterOptions,
    blacklist: HashSet<String>,
    relations: bool,
    joined: OnceCell<HashSet<String>>,
}

impl<'q, 'r, Q: FilterableQuery> ModelFilter<'q, 'r, Q> {
    pub fn new(
        query: &'q mut Q,
        input: impl Into<FilterInput>,
        def: Arc<FilterDef<Q>>,
        registry: &'r FilterRegistry<Q>,
    ) -> Self {
        let blacklist = def.blacklisted().clone();
        Self {
            query,
            input: input.into(),
            def,
            registry,
            options: registry.options().clone(),
            blacklist,
            relations: true,
            joined: OnceCell::new(),
        }
    }

    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Skips relation filtering. A filter running on a query that joined its
    /// entity in sees the parent's relations, not its own.
    pub fn without_relations(mut self) -> Self {
        self.relations = false;
        self
    }

    /// Applies every filter method the input names, then the relations.
    pub fn handle(&mut self) -> Result<&mut Q> {
        if let Some(setup) = self.def.setup_hook() {
            setup(&mut *self.query, &self.input)?;
        }

        for (key, value) in self.input.iter() {
            let method = self.options.method_name(key);
            if self.blacklist.contains(&handler_key(&method)) {
                trace!("`{}` is blacklisted on `{}`", method, self.def.entity());
                continue;
            }

            match self.def.handler(&method) {
                Some(handler) => {
                    debug!("{}::{}({})", self.def.entity(), method, value);
                    handler(&mut *self.query, value, &self.input)?;
                }
                None => trace!("no `{}` method on `{}`, skipping", method, self.def.entity()),
            }
        }

        if self.relations {
            self.filter_relations()?;
        }
        Ok(&mut *self.query)
    }

    /// Calls the method `name` directly.
    pub fn call(&mut self, name: &str, value: &Value) -> Result<()> {
        let Some(handler) = self.def.handler(name) else {
            return Err(FilterError::MethodNotFound {
                entity: self.def.entity().to_string(),
                method: name.to_string(),
            });
        };
        handler(&mut *self.query, value, &self.input)
    }

    fn filter_relations(&mut self) -> Result<()> {
        let def = Arc::clone(&self.def);

        for (relation, fields) in def.relations() {
            let subset = self.input.only(fields);
            if subset.is_empty() {
                continue;
            }

            let related = self.query.related(relation)?;
            let related_def = self.registry.get(&related.entity)?;
            let setup = def.relation_setup_hook(relation);

            if self.is_joined(&related.table) {
                debug!(
                    "`{}` is joined, filtering `{}` on the same query",
                    related.table, relation
                );
                let query = &mut *self.query;
                if let Some(setup) = setup {
                    setup(&mut *query, &subset)?;
                }
                ModelFilter::new(query, subset, related_def, self.registry)
                    .with_options(self.options.clone())
                    .without_relations()
                    .handle()?;
            } else {
                debug!("filtering `{}` through EXISTS", relation);
                let registry = self.registry;
                let options = self.options.clone();
                self.query.where_has(relation, move |subquery| {
                    if let Some(setup) = setup {
                        setup(&mut *subquery, &subset)?;
                    }
                    ModelFilter::new(subquery, subset, related_def, registry)
                        .with_options(options)
                        .handle()?;
                    Ok(())
                })?;
            }
        }

        Ok(())
    }

    fn is_joined(&self, table: &str) -> bool {
        self.joined
            .get_or_init(|| self.query.joined_tables().into_iter().collect())
            .contains(table)
    }

    /// The sanitized input.
    pub fn input(&self) -> &FilterInput {
        &self.input
    }

    pub fn input_value(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    pub fn input_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.input.get(key).unwrap_or(default)
    }

    /// Stops input dispatch from reaching `name`.
    pub fn blacklist_method(&mut self, name: &str) -> &mut Self {
        self.blacklist.insert(handler_key(name));
        self
    }

    pub fn whitelist_method(&mut self, name: &str) -> &mut Self {
        self.blacklist.remove(&handler_key(name));
        self
    }

    pub fn method_is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.contains(&handler_key(name))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;
    use sift_query::QueryError;

    use super::*;
    use crate::query::RelatedEntity;

    /// Records what filters do to it instead of building SQL.
    #[derive(Debug, Default)]
    struct Recorder {
        entity: String,
        joins: Vec<String>,
        join_lookups: Cell<usize>,
        ops: Vec<String>,
        exists: Vec<(String, Recorder)>,
    }

    impl Recorder {
        fn on(entity: &str) -> Self {
            Self {
                entity: entity.to_string(),
                ..Default::default()
            }
        }
    }

    impl FilterableQuery for Recorder {
        fn joined_tables(&self) -> Vec<String> {
            self.join_lookups.set(self.join_lookups.get() + 1);
            self.joins.clone()
        }

        fn related(&self, relation: &str) -> Result<RelatedEntity> {
            let (entity, table) = match (self.entity.as_str(), relation) {
                ("posts", "comments") => ("comments", "post_comments"),
                ("posts", "author") => ("users", "users"),
                ("orders", "customer") => ("customers", "customers"),
                _ => {
                    return Err(QueryError::UnknownRelation {
                        entity: self.entity.clone(),
                        relation: relation.to_string(),
                    }
                    .into())
                }
            };
            Ok(RelatedEntity {
                entity: entity.to_string(),
                table: table.to_string(),
            })
        }

        fn where_has<F>(&mut self, relation: &str, constrain: F) -> Result<()>
        where
            F: FnOnce(&mut Self) -> Result<()>,
        {
            let related = self.related(relation)?;
            let mut subquery = Recorder::on(&related.entity);
            constrain(&mut subquery)?;
            self.exists.push((relation.to_string(), subquery));
            Ok(())
        }
    }

    fn record(
        name: &'static str,
    ) -> impl Fn(&mut Recorder, &Value, &FilterInput) -> Result<()> + Send + Sync {
        move |query: &mut Recorder, value: &Value, _: &FilterInput| {
            query.ops.push(format!("{}:{}={}", query.entity, name, value));
            Ok(())
        }
    }

    fn registry() -> FilterRegistry<Recorder> {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterDef::new("posts")
                .on("title", record("title"))
                .on("status", record("status"))
                .on("name", record("name"))
                .on("createdAt", record("created_at"))
                .relation("comments", ["body", "author_id"])
                .relation("author", ["author_name"]),
        );
        registry.register(
            FilterDef::new("comments")
                .on("body", record("body"))
                .on("author", record("author")),
        );
        registry.register(FilterDef::new("users").on("author_name", record("author_name")));
        registry.register(FilterDef::new("orders").on("customer", record("customer")));
        registry
    }

    fn run(query: &mut Recorder, input: serde_json::Value) -> Result<()> {
        let registry = registry();
        let entity = query.entity.clone();
        registry.filter(query, &entity, FilterInput::from_json(input)?)?;
        Ok(())
    }

    #[test]
    fn test_empty_values_never_dispatched() {
        let mut query = Recorder::on("posts");
        run(&mut query, json!({"name": "Alice", "status": ""})).unwrap();
        assert_eq!(query.ops, vec![r#"posts:name="Alice""#]);
    }

    #[test]
    fn test_each_key_dispatched_once_in_order() {
        let mut query = Recorder::on("posts");
        run(
            &mut query,
            json!({"title": "rust", "unknown": 1, "created_at": "2024-01-01"}),
        )
        .unwrap();
        assert_eq!(
            query.ops,
            vec![
                r#"posts:title="rust""#,
                r#"posts:created_at="2024-01-01""#
            ]
        );
        assert!(query.exists.is_empty());
    }

    #[test]
    fn test_drop_id_dispatch() {
        let mut query = Recorder::on("orders");
        run(&mut query, json!({"customer_id": 5})).unwrap();
        assert_eq!(query.ops, vec!["orders:customer=5"]);
    }

    #[test]
    fn test_handle_is_repeatable() {
        let registry = registry();
        let def = registry.get("posts").unwrap();
        let input = FilterInput::from_json(json!({"title": "a", "body": "b"})).unwrap();

        let mut query = Recorder::on("posts");
        let mut filter = ModelFilter::new(&mut query, input, def, &registry);
        filter.handle().unwrap();
        let first = (filter.query.ops.clone(), filter.query.exists.len());

        filter.query.ops.clear();
        filter.query.exists.clear();
        filter.handle().unwrap();
        let second = (filter.query.ops.clone(), filter.query.exists.len());

        assert_eq!(first, second);
    }

    #[test]
    fn test_relation_gets_only_its_fields() {
        let mut query = Recorder::on("posts");
        run(&mut query, json!({"body": "x", "other": "y"})).unwrap();

        assert!(query.ops.is_empty());
        assert_eq!(query.exists.len(), 1);
        let (relation, subquery) = &query.exists[0];
        assert_eq!(relation, "comments");
        assert_eq!(subquery.ops, vec![r#"comments:body="x""#]);
    }

    #[test]
    fn test_sibling_applies_drop_id() {
        let mut query = Recorder::on("posts");
        run(&mut query, json!({"author_id": 7})).unwrap();
        assert_eq!(query.exists[0].1.ops, vec!["comments:author=7"]);
    }

    #[test]
    fn test_joined_relation_filters_same_query() {
        let mut query = Recorder::on("posts");
        query.joins.push("post_comments".to_string());
        run(&mut query, json!({"title": "t", "body": "x"})).unwrap();

        assert!(query.exists.is_empty());
        // the comments filter ran against the posts query itself
        assert_eq!(query.ops, vec![r#"posts:title="t""#, r#"posts:body="x""#]);
    }

    #[test]
    fn test_joined_sibling_skips_its_own_relations() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterDef::new("posts")
                .on("title", record("title"))
                .relation("comments", ["body", "author_name"]),
        );
        registry.register(
            FilterDef::new("comments")
                .on("author_name", record("author_name"))
                .relation("author", ["author_name"]),
        );
        registry.register(FilterDef::new("users").on("author_name", record("author_name")));

        let mut query = Recorder::on("posts");
        query.joins.push("post_comments".to_string());
        registry
            .filter(
                &mut query,
                "posts",
                FilterInput::from_json(json!({"author_name": "bob"})).unwrap(),
            )
            .unwrap();

        // `author` belongs to comments; resolving it on the posts query would
        // pick up the post's author instead
        assert!(query.exists.is_empty());
        assert_eq!(query.ops, vec![r#"posts:author_name="bob""#]);
    }

    #[test]
    fn test_joined_tables_looked_up_once() {
        let registry = registry();
        let def = registry.get("posts").unwrap();
        let input =
            FilterInput::from_json(json!({"body": "x", "author_name": "bob"})).unwrap();

        let mut query = Recorder::on("posts");
        let mut filter = ModelFilter::new(&mut query, input, def, &registry);
        filter.handle().unwrap();
        assert_eq!(filter.query.exists.len(), 2);
        assert_eq!(filter.query.join_lookups.get(), 1);

        // joins made after the first lookup are not seen by this dispatcher
        filter.query.joins.push("post_comments".to_string());
        filter.query.exists.clear();
        filter.handle().unwrap();
        assert_eq!(filter.query.join_lookups.get(), 1);
        assert_eq!(filter.query.exists.len(), 2);
        assert_eq!(filter.query.exists[0].0, "comments");
    }

    #[test]
    fn test_relation_without_overlap_skipped() {
        let mut query = Recorder::on("posts");
        run(&mut query, json!({"title": "t"})).unwrap();
        assert!(query.exists.is_empty());
    }

    #[test]
    fn test_unknown_relation_propagates() {
        let mut registry = FilterRegistry::new();
        registry.register(FilterDef::new("posts").relation("tags", ["tag"]));

        let mut query = Recorder::on("posts");
        let err = registry
            .filter(&mut query, "posts", FilterInput::from_json(json!({"tag": "x"})).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::Query(QueryError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn test_missing_related_filter() {
        let mut registry = FilterRegistry::new();
        registry.register(FilterDef::new("posts").relation("author", ["author_name"]));

        let mut query = Recorder::on("posts");
        let err = registry
            .filter(
                &mut query,
                "posts",
                FilterInput::from_json(json!({"author_name": "bob"})).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, FilterError::MissingFilter(name) if name == "users"));
    }

    #[test]
    fn test_handler_error_stops_dispatch() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterDef::new("posts")
                .on("title", |_: &mut Recorder, _: &Value, _: &FilterInput| {
                    Err(FilterError::backend("connection reset"))
                })
                .on("status", record("status")),
        );

        let mut query = Recorder::on("posts");
        let err = registry
            .filter(
                &mut query,
                "posts",
                FilterInput::from_json(json!({"title": "a", "status": "b"})).unwrap(),
            )
            .unwrap_err();

        assert!(matches!(err, FilterError::Backend(_)));
        assert_eq!(err.to_string(), "connection reset");
        assert!(query.ops.is_empty());
    }

    #[test]
    fn test_setup_hooks() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterDef::new("posts")
                .setup(|query: &mut Recorder, _: &FilterInput| {
                    query.ops.push("setup".into());
                    Ok(())
                })
                .relation("comments", ["body"])
                .relation_setup("comments", |query: &mut Recorder, input: &FilterInput| {
                    query.ops.push(format!("relation_setup:{}", input.len()));
                    Ok(())
                }),
        );
        registry.register(FilterDef::new("comments").on("body", record("body")));

        let mut query = Recorder::on("posts");
        registry
            .filter(&mut query, "posts", FilterInput::from_json(json!({"body": "x"})).unwrap())
            .unwrap();

        assert_eq!(query.ops, vec!["setup"]);
        assert_eq!(
            query.exists[0].1.ops,
            vec!["relation_setup:1", r#"comments:body="x""#]
        );
    }

    #[test]
    fn test_call_and_blacklist() {
        let registry = registry();
        let def = registry.get("posts").unwrap();
        let input = FilterInput::from_json(json!({"title": "a", "status": "draft"})).unwrap();

        let mut query = Recorder::on("posts");
        let mut filter = ModelFilter::new(&mut query, input, def, &registry);
        filter.blacklist_method("status");
        assert!(filter.method_is_blacklisted("status"));
        filter.handle().unwrap();
        assert_eq!(filter.query.ops, vec![r#"posts:title="a""#]);

        filter.whitelist_method("status");
        assert!(!filter.method_is_blacklisted("status"));

        filter.call("status", &json!("published")).unwrap();
        assert_eq!(filter.query.ops.last().unwrap(), r#"posts:status="published""#);

        let err = filter.call("missing", &json!(1)).unwrap_err();
        assert!(matches!(
            err,
            FilterError::MethodNotFound { ref method, .. } if method == "missing"
        ));
    }

    #[test]
    fn test_definition_blacklist() {
        let mut registry = FilterRegistry::new();
        registry.register(
            FilterDef::new("posts")
                .on("title", record("title"))
                .on("status", record("status"))
                .blacklist("status"),
        );

        let mut query = Recorder::on("posts");
        registry
            .filter(
                &mut query,
                "posts",
                FilterInput::from_json(json!({"title": "a", "status": "b"})).unwrap(),
            )
            .unwrap();
        assert_eq!(query.ops, vec![r#"posts:title="a""#]);
    }

    #[test]
    fn test_input_accessors() {
        let registry = registry();
        let def = registry.get("posts").unwrap();
        let input = FilterInput::from_json(json!({"title": "a", "status": ""})).unwrap();

        let mut query = Recorder::on("posts");
        let filter = ModelFilter::new(&mut query, input, def, &registry);
        let fallback = json!("none");

        assert_eq!(filter.input().len(), 1);
        assert_eq!(filter.input_value("title"), Some(&json!("a")));
        assert_eq!(filter.input_value("status"), None);
        assert_eq!(filter.input_or("status", &fallback), &fallback);
    }
}
