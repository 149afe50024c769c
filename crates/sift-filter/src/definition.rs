//! Per-entity filter definitions.

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde_json::Value;

use crate::{error::Result, input::FilterInput, naming::handler_key};

/// A filter method: narrows the query for one input value.
///
/// The full input is passed along for methods that depend on other fields.
pub type Handler<Q> = Box<dyn Fn(&mut Q, &Value, &FilterInput) -> Result<()> + Send + Sync>;

/// Runs before a filter's methods, with the input the filter received.
pub type SetupHook<Q> = Box<dyn Fn(&mut Q, &FilterInput) -> Result<()> + Send + Sync>;

/// The filter for one entity: its methods, the relations its input can
/// cascade into, and optional setup hooks.
///
/// ```
/// use sift_filter::{FilterDef, FilterError};
/// use serde_json::Value;
///
/// let def: FilterDef<Vec<String>> = FilterDef::new("posts")
///     .on("title", |query: &mut Vec<String>, value: &Value, _| {
///         query.push(format!("title = {value}"));
///         Ok::<_, FilterError>(())
///     })
///     .relation("comments", ["body"]);
///
/// assert!(def.has_handler("title"));
/// ```
pub struct FilterDef<Q> {
    entity: String,
    handlers: HashMap<String, Handler<Q>>,
    relations: Vec<(String, Vec<String>)>,
    setup: Option<SetupHook<Q>>,
    relation_setups: HashMap<String, SetupHook<Q>>,
    blacklist: HashSet<String>,
}

impl<Q> FilterDef<Q> {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            handlers: HashMap::new(),
            relations: Vec::new(),
            setup: None,
            relation_setups: HashMap::new(),
            blacklist: HashSet::new(),
        }
    }

    /// Registers the method `name`. Registering a name twice replaces the
    /// earlier handler.
    pub fn on<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Q, &Value, &FilterInput) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(handler_key(name), Box::new(handler));
        self
    }

    /// Declares that input `fields` cascade into the filter of `relation`.
    pub fn relation<I, S>(mut self, name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = fields.into_iter().map(Into::into).collect();
        match self.relations.iter_mut().find(|(r, _)| r == name) {
            Some((_, existing)) => *existing = fields,
            None => self.relations.push((name.to_string(), fields)),
        }
        self
    }

    pub fn setup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Q, &FilterInput) -> Result<()> + Send + Sync + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Hook run on the query the related filter operates on, before any of
    /// its methods. Receives only the input forwarded to the relation.
    pub fn relation_setup<F>(mut self, relation: &str, hook: F) -> Self
    where
        F: Fn(&mut Q, &FilterInput) -> Result<()> + Send + Sync + 'static,
    {
        self.relation_setups
            .insert(relation.to_string(), Box::new(hook));
        self
    }

    /// Keeps input dispatch away from `name`.
    pub fn blacklist(mut self, name: &str) -> Self {
        self.blacklist.insert(handler_key(name));
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn handler(&self, name: &str) -> Option<&Handler<Q>> {
        self.handlers.get(&handler_key(name))
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handler(name).is_some()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn relations(&self) -> &[(String, Vec<String>)] {
        &self.relations
    }

    pub fn setup_hook(&self) -> Option<&SetupHook<Q>> {
        self.setup.as_ref()
    }

    pub fn relation_setup_hook(&self, relation: &str) -> Option<&SetupHook<Q>> {
        self.relation_setups.get(relation)
    }

    pub(crate) fn blacklisted(&self) -> &HashSet<String> {
        &self.blacklist
    }
}

impl<Q> fmt::Debug for FilterDef<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDef")
            .field("entity", &self.entity)
            .field("methods", &self.methods())
            .field("relations", &self.relations)
            .field("blacklist", &self.blacklist)
            .finish()
    }
}
