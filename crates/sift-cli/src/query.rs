use std::path::Path;

use nu_ansi_term::Color::{Cyan, Green, LightRed};
use sift_filter::{Declarative, Paginate};
use sift_query::{DbConnection, SelectQuery};
use tracing::{debug, info};

use crate::{
    cli::FilterArgs,
    error::CliResult,
    utils::{read_input, Colored},
};

pub struct SqlOptions {
    pub inline: bool,
    pub count: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn build_query(filters: &Declarative, args: &FilterArgs) -> CliResult<SelectQuery> {
    let input = read_input(&args.input, args.json)?;
    debug!("{} input field(s) for `{}`", input.len(), args.entity);
    Ok(filters.filtered(&args.entity, input)?)
}

pub fn render_sql(filters: &Declarative, args: &FilterArgs, options: &SqlOptions) -> CliResult<()> {
    let mut query = build_query(filters, args)?;
    if let Some(page) = options.page {
        query.paginate(page, options.per_page, filters.registry.options());
    }

    if options.inline && !options.count {
        info!("{}", Colored(Green, query.to_debug_sql()));
        return Ok(());
    }

    let (sql, params) = if options.count {
        query.to_count_sql()
    } else {
        query.to_sql()
    };

    info!("{}", Colored(Green, &sql));
    for (idx, param) in params.iter().enumerate() {
        info!("  {} {}", Colored(Cyan, format!("?{}", idx + 1)), param);
    }
    Ok(())
}

pub fn count_rows(filters: &Declarative, db: &Path, args: &FilterArgs) -> CliResult<()> {
    let query = build_query(filters, args)?;
    debug!("{}", query.to_debug_sql());

    let mut conn = DbConnection::open(db)?;
    let count = conn.count(&query)?;
    info!("{}", Colored(LightRed, count));
    Ok(())
}
