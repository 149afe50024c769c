//! Filters declared in the configuration file.
//!
//! Every `[[entities]]` entry becomes a schema entity and a [`FilterDef`]
//! whose methods apply one operator to one column.

use std::sync::Arc;

use serde_json::Value as Json;
use sift_config::{
    config::Config,
    entity::{EntityConfig, FilterOp, RelationConfig, RelationType},
};
use sift_query::{
    schema::validate_identifier, traits::Expression, Col, Entity, Relation, RelationKind, Schema,
    SelectQuery, Value,
};
use tracing::{debug, warn};

use crate::{
    definition::FilterDef,
    error::Result,
    input::FilterInput,
    naming::{handler_key, FilterOptions},
    registry::FilterRegistry,
};

/// Schema and filters built from a [`Config`].
#[derive(Debug)]
pub struct Declarative {
    pub schema: Arc<Schema>,
    pub registry: FilterRegistry<SelectQuery>,
}

impl Declarative {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut schema = Schema::new();
        let options = FilterOptions::from(config);
        let mut registry = FilterRegistry::with_options(options.clone());

        for entity in &config.entities {
            schema.insert(schema_entity(config, entity))?;
            registry.register(filter_def(entity, &options)?);
        }
        schema.validate()?;

        debug!("built {} declarative filter(s)", registry.entities().len());
        Ok(Self {
            schema: Arc::new(schema),
            registry,
        })
    }

    /// A fresh query on `entity`.
    pub fn query(&self, entity: &str) -> Result<SelectQuery> {
        Ok(SelectQuery::new(self.schema.clone(), entity)?)
    }

    /// Builds a query on `entity` and filters it with `input`.
    pub fn filtered(&self, entity: &str, input: impl Into<FilterInput>) -> Result<SelectQuery> {
        let mut query = self.query(entity)?;
        self.registry.filter(&mut query, entity, input)?;
        Ok(query)
    }
}

fn schema_entity(config: &Config, entity: &EntityConfig) -> Entity {
    let mut out = Entity::new(&entity.name, entity.table()).primary_key(entity.primary_key());
    for relation in &entity.relations {
        out = out.relation(schema_relation(config, entity, relation));
    }
    out
}

fn schema_relation(config: &Config, entity: &EntityConfig, relation: &RelationConfig) -> Relation {
    let kind = match relation.kind {
        RelationType::HasMany => RelationKind::HasMany,
        RelationType::HasOne => RelationKind::HasOne,
        RelationType::BelongsTo => RelationKind::BelongsTo,
    };

    // has_many/has_one point back at this entity, belongs_to at the target
    let local_key = relation.local_key.clone().unwrap_or_else(|| match kind {
        RelationKind::BelongsTo => config
            .get_entity(&relation.entity)
            .map(|target| target.primary_key().to_string())
            .unwrap_or_else(|| "id".to_string()),
        RelationKind::HasMany | RelationKind::HasOne => entity.primary_key().to_string(),
    });

    Relation {
        name: relation.name.clone(),
        kind,
        entity: relation.entity.clone(),
        foreign_key: relation.foreign_key.clone(),
        local_key,
    }
}

/// True when no input key dispatches to `method` under `options`.
fn shadowed_by_naming(method: &str, options: &FilterOptions) -> bool {
    handler_key(&options.method_name(method)) != handler_key(method)
}

fn filter_def(entity: &EntityConfig, options: &FilterOptions) -> Result<FilterDef<SelectQuery>> {
    let mut def = FilterDef::new(&entity.name);

    for (method, spec) in &entity.filters {
        if shadowed_by_naming(method, options) {
            warn!(
                "Filter '{}' of '{}' is unreachable: input `{}` dispatches to `{}`",
                method,
                entity.name,
                method,
                options.method_name(method)
            );
        }
        let column = spec.column(method);
        validate_identifier(column)?;
        let column = format!("{}.{}", entity.table(), column);
        let op = spec.op();

        def = def.on(method, move |query: &mut SelectQuery, value: &Json, _: &FilterInput| {
            apply(query, Col::<Value>::named(column.as_str()), op, value);
            Ok(())
        });
    }

    for relation in &entity.relations {
        def = def.relation(&relation.name, relation.fields.iter().cloned());
    }

    for method in &entity.blacklist {
        def = def.blacklist(method);
    }

    Ok(def)
}

fn apply(query: &mut SelectQuery, column: Col<Value>, op: FilterOp, value: &Json) {
    match op {
        FilterOp::Eq => query.filter(column.eq(value)),
        FilterOp::Ne => query.filter(column.ne(value)),
        FilterOp::Gt => query.filter(column.gt(value)),
        FilterOp::Gte => query.filter(column.gte(value)),
        FilterOp::Lt => query.filter(column.lt(value)),
        FilterOp::Lte => query.filter(column.lte(value)),
        FilterOp::Like => query.filter(column.like(pattern(value))),
        FilterOp::ILike => query.filter(column.ilike(pattern(value))),
        FilterOp::In => match value {
            Json::Array(items) => query.filter(column.in_(items.iter().map(Value::from))),
            single => query.filter(column.in_([Value::from(single)])),
        },
        FilterOp::Null => {
            if Value::from(value).is_truthy() {
                query.filter(column.null())
            } else {
                query.filter(column.not_null())
            }
        }
    };
}

fn pattern(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
