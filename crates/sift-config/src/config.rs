use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{info, warn};

use crate::{
    annotations::{annotate_toml_array_of_tables, annotate_toml_table},
    entity::{EntityConfig, RelationConfig},
    error::{ConfigError, Result},
    utils::xdg_config_home,
};

pub const DEFAULT_PAGINATE_LIMIT: u32 = 15;

/// Casing applied to input keys before they are matched against filter methods.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MethodCasing {
    /// `created_at`
    #[default]
    Snake,
    /// `createdAt`
    Camel,
}

/// Filter configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields, PartialEq)]
pub struct Config {
    /// Default number of rows per page when paginating a filtered query.
    /// Default: 15
    pub paginate_limit: Option<u32>,

    /// Strip a trailing `_id` from input keys before looking up the filter
    /// method, so `customer_id=5` calls the `customer` filter.
    /// Default: true
    pub drop_id: Option<bool>,

    /// Casing of filter method names: "snake" or "camel".
    /// Default: "snake"
    pub method_casing: Option<MethodCasing>,

    /// Entities with their declarative filters and relations.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("SIFT_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("sift").join("config.toml"),
    })
});

/// Path of the configuration file currently in use.
pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|poisoned| poisoned.into_inner().to_path_buf())
}

/// Points [`Config::new`] and [`generate_default_config`] at another file.
pub fn set_config_path(path: impl Into<PathBuf>) {
    let mut guard = CONFIG_PATH
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = path.into();
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            paginate_limit: Some(DEFAULT_PAGINATE_LIMIT),
            drop_id: Some(true),
            method_casing: Some(MethodCasing::Snake),
            entities: Vec::new(),
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        if std::env::var("SIFT_STEALTH").is_ok() {
            return Ok(Self::default_config());
        }

        let path = config_path();
        match Self::load(&path) {
            Err(ConfigError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default_config())
            }
            other => other,
        }
    }

    /// Loads and resolves the configuration at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        let limit = self.paginate_limit.get_or_insert(DEFAULT_PAGINATE_LIMIT);
        if *limit == 0 {
            return Err(ConfigError::InvalidPaginateLimit);
        }
        self.drop_id.get_or_insert(true);
        self.method_casing.get_or_insert_with(MethodCasing::default);

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(ConfigError::DuplicateEntityName(entity.name.clone()));
            }
        }

        for entity in &self.entities {
            for relation in &entity.relations {
                if !seen.contains(relation.entity.as_str()) {
                    return Err(ConfigError::UnknownRelationTarget {
                        entity: entity.name.clone(),
                        relation: relation.name.clone(),
                        target: relation.entity.clone(),
                    });
                }
                if relation.fields.is_empty() {
                    warn!(
                        "Relation '{}' of '{}' declares no fields; it will never be filtered",
                        relation.name, entity.name
                    );
                }
            }
        }

        Ok(())
    }

    pub fn paginate_limit(&self) -> u32 {
        self.paginate_limit.unwrap_or(DEFAULT_PAGINATE_LIMIT)
    }

    pub fn drop_id(&self) -> bool {
        self.drop_id.unwrap_or(true)
    }

    pub fn method_casing(&self) -> MethodCasing {
        self.method_casing.unwrap_or_default()
    }

    pub fn get_entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        use toml_edit::Item;

        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(entities) = doc
            .get_mut("entities")
            .and_then(Item::as_array_of_tables_mut)
        {
            annotate_toml_array_of_tables::<EntityConfig>(entities)?;

            for entity in entities.iter_mut() {
                if let Some(relations) = entity
                    .get_mut("relations")
                    .and_then(Item::as_array_of_tables_mut)
                {
                    annotate_toml_array_of_tables::<RelationConfig>(relations)?;
                }
            }
        }

        Ok(doc)
    }
}

/// Writes an annotated default configuration to [`config_path`].
pub fn generate_default_config() -> Result<PathBuf> {
    let path = config_path();

    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::{entity::RelationType, test_utils::with_env};

    const BLOG: &str = r#"
        paginate_limit = 25
        method_casing = "camel"

        [[entities]]
        name = "posts"

        [entities.filters]
        title = "like"

        [[entities.relations]]
        name = "comments"
        entity = "comments"
        kind = "has_many"
        foreign_key = "post_id"
        fields = ["body"]

        [[entities]]
        name = "comments"
        table = "post_comments"

        [entities.filters]
        body = "ilike"
    "#;

    #[test]
    fn test_from_toml_resolves_defaults() {
        let config = Config::from_toml(BLOG).unwrap();

        assert_eq!(config.paginate_limit(), 25);
        assert!(config.drop_id());
        assert_eq!(config.method_casing(), MethodCasing::Camel);

        let posts = config.get_entity("posts").unwrap();
        assert_eq!(posts.relations[0].kind, RelationType::HasMany);
        assert_eq!(config.get_entity("comments").unwrap().table(), "post_comments");
        assert!(config.get_entity("users").is_none());
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let result = Config::from_toml(
            r#"
            [[entities]]
            name = "posts"
            [[entities]]
            name = "posts"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateEntityName(_))));
    }

    #[test]
    fn test_unknown_relation_target_rejected() {
        let result = Config::from_toml(
            r#"
            [[entities]]
            name = "posts"
            [[entities.relations]]
            name = "tags"
            entity = "tags"
            kind = "has_many"
            foreign_key = "post_id"
            fields = ["tag"]
            "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::UnknownRelationTarget { target, .. }) if target == "tags"
        ));
    }

    #[test]
    fn test_zero_paginate_limit_rejected() {
        let result = Config::from_toml("paginate_limit = 0");
        assert!(matches!(result, Err(ConfigError::InvalidPaginateLimit)));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::from_toml(BLOG).unwrap();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized = Config::from_toml(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_annotated_document_documents_entities() {
        let config = Config::from_toml(BLOG).unwrap();
        let doc = config.to_annotated_document().unwrap().to_string();
        assert!(doc.contains("# Unique entity name"));
        assert!(doc.contains("# Relation name"));
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        set_config_path(&path);

        std::env::remove_var("SIFT_STEALTH");
        let config = Config::new().unwrap();
        assert_eq!(config, Config::default_config());
    }

    #[test]
    #[serial]
    fn test_generate_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sift").join("config.toml");
        set_config_path(&path);

        let written = generate_default_config().unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.paginate_limit(), DEFAULT_PAGINATE_LIMIT);

        assert!(matches!(
            generate_default_config(),
            Err(ConfigError::ConfigAlreadyExists)
        ));
    }

    #[test]
    #[serial]
    fn test_save_writes_config_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        set_config_path(&path);

        let config = Config::from_toml(BLOG).unwrap();
        config.save().unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_stealth_ignores_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "paginate_limit = 99").unwrap();
        set_config_path(&path);

        with_env(&[("SIFT_STEALTH", "1")], || {
            assert_eq!(Config::new().unwrap().paginate_limit(), DEFAULT_PAGINATE_LIMIT);
        });
        std::env::remove_var("SIFT_STEALTH");
        assert_eq!(Config::new().unwrap().paginate_limit(), 99);
    }
}
