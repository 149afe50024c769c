//! Entity and relation metadata.
//!
//! A [`Schema`] knows, for each entity, its table and the relations that can
//! be joined or checked with `EXISTS`. Identifiers end up verbatim in SQL, so
//! everything is validated on insertion.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("unable to compile identifier regex")
});

/// Checks that `name` can be interpolated into SQL as a bare identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Related rows carry `foreign_key` pointing at the parent's `local_key`.
    HasMany,
    /// Same shape as [`RelationKind::HasMany`], at most one row.
    HasOne,
    /// The parent carries `foreign_key` pointing at the related row's `local_key`.
    BelongsTo,
}

/// A named association from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    /// Name of the related entity.
    pub entity: String,
    pub foreign_key: String,
    pub local_key: String,
}

impl Relation {
    /// The join condition between `parent_table` and `related_table`.
    pub fn correlation(&self, parent_table: &str, related_table: &str) -> String {
        match self.kind {
            RelationKind::HasMany | RelationKind::HasOne => format!(
                "{}.{} = {}.{}",
                related_table, self.foreign_key, parent_table, self.local_key
            ),
            RelationKind::BelongsTo => format!(
                "{}.{} = {}.{}",
                related_table, self.local_key, parent_table, self.foreign_key
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub primary_key: String,
    pub relations: Vec<Relation>,
}

impl Entity {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            relations: Vec::new(),
        }
    }

    pub fn primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// `name` rows of `entity` reference this entity through `foreign_key`.
    pub fn has_many(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let local_key = self.primary_key.clone();
        self.relation(Relation {
            name: name.into(),
            kind: RelationKind::HasMany,
            entity: entity.into(),
            foreign_key: foreign_key.into(),
            local_key,
        })
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let local_key = self.primary_key.clone();
        self.relation(Relation {
            name: name.into(),
            kind: RelationKind::HasOne,
            entity: entity.into(),
            foreign_key: foreign_key.into(),
            local_key,
        })
    }

    /// This entity references `entity` through its own `foreign_key` column.
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation(Relation {
            name: name.into(),
            kind: RelationKind::BelongsTo,
            entity: entity.into(),
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
        })
    }

    pub fn get_relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    fn validate(&self) -> Result<()> {
        validate_identifier(&self.name)?;
        validate_identifier(&self.table)?;
        validate_identifier(&self.primary_key)?;
        for relation in &self.relations {
            validate_identifier(&relation.name)?;
            validate_identifier(&relation.entity)?;
            validate_identifier(&relation.foreign_key)?;
            validate_identifier(&relation.local_key)?;
        }
        Ok(())
    }
}

/// All entities known to a query.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity after validating every identifier it declares.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        entity.validate()?;
        if self.entities.contains_key(&entity.name) {
            return Err(QueryError::DuplicateEntity(entity.name));
        }
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn with(mut self, entity: Entity) -> Result<Self> {
        self.insert(entity)?;
        Ok(self)
    }

    pub fn entity(&self, name: &str) -> Result<&Entity> {
        self.entities
            .get(name)
            .ok_or_else(|| QueryError::UnknownEntity(name.to_string()))
    }

    /// Resolves `relation` on `entity` together with the related entity.
    pub fn relation(&self, entity: &str, relation: &str) -> Result<(&Relation, &Entity)> {
        let parent = self.entity(entity)?;
        let rel = parent
            .get_relation(relation)
            .ok_or_else(|| QueryError::UnknownRelation {
                entity: entity.to_string(),
                relation: relation.to_string(),
            })?;
        let related = self.entity(&rel.entity)?;
        Ok((rel, related))
    }

    /// Checks that every relation points at a declared entity.
    pub fn validate(&self) -> Result<()> {
        for entity in self.entities.values() {
            for relation in &entity.relations {
                self.entity(&relation.entity)?;
            }
        }
        Ok(())
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Schema {
        Schema::new()
            .with(
                Entity::new("posts", "posts")
                    .has_many("comments", "comments", "post_id")
                    .belongs_to("author", "users", "author_id"),
            )
            .unwrap()
            .with(Entity::new("comments", "comments"))
            .unwrap()
            .with(Entity::new("users", "users"))
            .unwrap()
    }

    #[test]
    fn test_correlation_directions() {
        let schema = blog();
        let (comments, related) = schema.relation("posts", "comments").unwrap();
        assert_eq!(
            comments.correlation("posts", &related.table),
            "comments.post_id = posts.id"
        );

        let (author, related) = schema.relation("posts", "author").unwrap();
        assert_eq!(
            author.correlation("posts", &related.table),
            "users.id = posts.author_id"
        );
    }

    #[test]
    fn test_unknown_relation() {
        let schema = blog();
        assert!(matches!(
            schema.relation("posts", "tags"),
            Err(QueryError::UnknownRelation { .. })
        ));
        assert!(matches!(
            schema.relation("tags", "posts"),
            Err(QueryError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let mut schema = Schema::new();
        let result = schema.insert(Entity::new("posts", "posts; DROP TABLE users"));
        assert!(matches!(result, Err(QueryError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_duplicate_entity() {
        let mut schema = blog();
        assert!(matches!(
            schema.insert(Entity::new("posts", "posts")),
            Err(QueryError::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_validate_dangling_relation() {
        let schema = Schema::new()
            .with(Entity::new("posts", "posts").has_many("tags", "tags", "post_id"))
            .unwrap();
        assert!(matches!(
            schema.validate(),
            Err(QueryError::UnknownEntity(name)) if name == "tags"
        ));
    }
}
