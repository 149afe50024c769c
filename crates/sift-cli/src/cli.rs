use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Entity and request input shared by the filtering commands.
#[derive(ClapArgs)]
pub struct FilterArgs {
    /// Entity to filter
    #[arg(required = true)]
    pub entity: String,

    /// Request input as a query string (`title=rust&tags[]=a`), or `-` to read stdin
    #[arg(required = true)]
    pub input: String,

    /// Read the input as a JSON object instead of a query string
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration file to stdout
    Config {
        /// Write an annotated default configuration instead
        #[arg(long)]
        init: bool,
    },

    /// List the entities filters are declared for
    #[clap(name = "entities", visible_alias = "ls")]
    Entities,

    /// Print the SQL a request input produces
    #[command(arg_required_else_help = true)]
    Sql {
        #[command(flatten)]
        filter: FilterArgs,

        /// Inline bound parameters into the printed SQL
        #[arg(long)]
        inline: bool,

        /// Print the COUNT query instead
        #[arg(long)]
        count: bool,

        /// Page to select (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Rows per page; defaults to `paginate_limit`
        #[arg(long, requires = "page")]
        per_page: Option<u32>,
    },

    /// Count the rows of a SQLite database matching a request input
    #[command(arg_required_else_help = true)]
    Count {
        /// SQLite database file
        #[arg(long, required = true, value_hint = ValueHint::FilePath)]
        db: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
}
