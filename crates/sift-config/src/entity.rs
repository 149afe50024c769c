use std::collections::BTreeMap;

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

/// A filterable entity
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields, PartialEq)]
pub struct EntityConfig {
    /// Unique entity name. Relations and the CLI refer to entities by this name.
    pub name: String,

    /// Table backing the entity.
    /// Default: the entity name
    pub table: Option<String>,

    /// Primary key column.
    /// Default: "id"
    pub primary_key: Option<String>,

    /// Methods that request input may never trigger.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blacklist: Vec<String>,

    /// Filter methods for this entity, keyed by method name.
    /// A value is either an operator ("eq", "ne", "gt", "gte", "lt", "lte",
    /// "like", "ilike", "in", "null") applied to the column of the same name,
    /// or a table `{ column = "...", op = "..." }`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, FilterSpec>,

    /// Relations whose fields cascade into the related entity's filter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationConfig>,
}

impl EntityConfig {
    pub fn table(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    pub fn primary_key(&self) -> &str {
        self.primary_key.as_deref().unwrap_or("id")
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationConfig> {
        self.relations.iter().find(|r| r.name == name)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FilterSpec {
    Op(FilterOp),
    Column { column: String, op: FilterOp },
}

impl FilterSpec {
    /// Column the filter applies to; `method` when not overridden.
    pub fn column<'a>(&'a self, method: &'a str) -> &'a str {
        match self {
            FilterSpec::Op(_) => method,
            FilterSpec::Column { column, .. } => column,
        }
    }

    pub fn op(&self) -> FilterOp {
        match self {
            FilterSpec::Op(op) | FilterSpec::Column { op, .. } => *op,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    #[serde(rename = "ilike")]
    ILike,
    In,
    Null,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    HasMany,
    HasOne,
    BelongsTo,
}

/// A relation to another entity
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields, PartialEq)]
pub struct RelationConfig {
    /// Relation name, used in `where_has` and joins.
    pub name: String,

    /// Name of the related entity.
    pub entity: String,

    /// "has_many", "has_one" or "belongs_to".
    pub kind: RelationType,

    /// For has_many/has_one the column on the related table, for belongs_to
    /// the column on this entity's table.
    pub foreign_key: String,

    /// The key `foreign_key` points at.
    /// Default: this entity's primary key (has_many/has_one) or "id" (belongs_to)
    pub local_key: Option<String>,

    /// Input fields forwarded to the related entity's filter.
    #[serde(default)]
    pub fields: Vec<String>,
}
