//! Macros for defining entity columns.
//!
//! The [`define_entity!`] macro generates table-qualified column constants,
//! tying database column names to Rust types.

/// Defines a module with typed column constants for a database table.
///
/// # Syntax
///
/// ```ignore
/// define_entity!(
///     users {
///         table: "users",
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name"
///         }
///     }
/// );
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod users {
///     pub const TABLE: &str = "users";
///     pub const ID: sift_query::Col<i64> = sift_query::Col::new("users.id");
///     pub const NAME: sift_query::Col<String> = sift_query::Col::new("users.name");
/// }
/// ```
///
/// Columns are qualified with the table name so filters written against them
/// stay unambiguous when the table is joined into another entity's query.
#[macro_export]
macro_rules! define_entity {
    (
        $entity:ident {
            table: $table:literal,
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            }
        }
    ) => {
        #[allow(dead_code)]
        pub mod $entity {
            use $crate::expr::column::Col;

            pub const TABLE: &str = $table;

            $(
                pub const $col_name: Col<$col_type> = Col::new(concat!($table, ".", $db_col));
            )*
        }
    };
}
