//! Mapping from input keys to filter method names.

use convert_case::{Case, Casing};
use sift_config::config::{Config, MethodCasing, DEFAULT_PAGINATE_LIMIT};

/// Knobs shared by every filter built from one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOptions {
    /// Strip a trailing `_id` from input keys.
    pub drop_id: bool,
    pub casing: MethodCasing,
    /// Page size used when a caller paginates without one.
    pub paginate_limit: u32,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            drop_id: true,
            casing: MethodCasing::default(),
            paginate_limit: DEFAULT_PAGINATE_LIMIT,
        }
    }
}

impl From<&Config> for FilterOptions {
    fn from(config: &Config) -> Self {
        Self {
            drop_id: config.drop_id(),
            casing: config.method_casing(),
            paginate_limit: config.paginate_limit(),
        }
    }
}

impl FilterOptions {
    /// Derives the method an input key dispatches to.
    ///
    /// `customer_id` becomes `customer` when `drop_id` is set, dots are
    /// removed (`author.name` -> `authorname`) and the result is converted to
    /// the configured casing.
    pub fn method_name(&self, key: &str) -> String {
        let key = match key.strip_suffix("_id") {
            Some(stripped) if self.drop_id && !stripped.is_empty() => stripped,
            _ => key,
        };
        let key = key.replace('.', "");
        match self.casing {
            MethodCasing::Snake => key.to_case(Case::Snake),
            MethodCasing::Camel => key.to_case(Case::Camel),
        }
    }
}

/// Lookup key for handler tables. Both spellings of a method resolve to it,
/// so `createdAt` and `created_at` name the same handler.
pub(crate) fn handler_key(name: &str) -> String {
    name.replace('.', "").to_case(Case::Snake)
}
