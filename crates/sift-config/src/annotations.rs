//! Turns struct doc comments into TOML comments for the generated config file.

use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{ArrayOfTables, Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

fn comment_lines(docs: &str) -> String {
    docs.lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect()
}

/// Appends `docs` as `#` comment lines to the prefix of `decor`, keeping any
/// comment already there and separating the two with an empty comment line.
pub fn append_docs_as_toml_comments(decor: &mut Decor, docs: &str) {
    let comments = comment_lines(docs);
    let existing = decor
        .prefix()
        .and_then(RawString::as_str)
        .unwrap_or_default()
        .to_string();

    let new_prefix = match existing.lines().last() {
        None => format!("{existing}{comments}"),
        Some("") => format!("{existing}{comments}"),
        Some(_) => format!("{existing}#\n{comments}"),
    };
    decor.set_prefix(new_prefix);
}

/// Annotates every key of `table` with the field docs of `T`.
///
/// Root tables don't get the container-level doc comment.
pub fn annotate_toml_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        append_docs_as_toml_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            warn!(
                "Field '{}' has no documentation in '{}'",
                name,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => append_docs_as_toml_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => append_docs_as_toml_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                if let Some(first) = array.iter_mut().next() {
                    append_docs_as_toml_comments(first.decor_mut(), docs);
                }
            }
        }
    }

    Ok(())
}

/// Annotates the first table of `array` with the docs of `T`; every entry
/// shares the same shape, so documenting one is enough.
pub fn annotate_toml_array_of_tables<T>(array: &mut ArrayOfTables) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if let Some(first_table) = array.iter_mut().next() {
        annotate_toml_table::<T>(first_table, false)
            .map_err(|err| ConfigError::AnnotateFirstTable(err.to_string()))?;
    }
    Ok(())
}
