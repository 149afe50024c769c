//! Request filters for sift queries.
//!
//! A [`FilterDef`] maps input fields to methods that narrow a query. The
//! [`ModelFilter`] dispatcher applies them for one request and cascades
//! relation fields into the related entity's filter, looked up in a
//! [`FilterRegistry`]. Filters run against anything implementing
//! [`FilterableQuery`]; `sift-query`'s [`SelectQuery`](sift_query::SelectQuery)
//! is the stock implementation, and [`Declarative`] builds filters for it
//! from the configuration file.

pub mod declarative;
pub mod definition;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod naming;
pub mod query;
pub mod registry;

pub use declarative::Declarative;
pub use definition::{FilterDef, Handler, SetupHook};
pub use dispatcher::ModelFilter;
pub use error::{FilterError, Result};
pub use input::FilterInput;
pub use naming::FilterOptions;
pub use query::{FilterableQuery, Paginate, RelatedEntity};
pub use registry::FilterRegistry;
