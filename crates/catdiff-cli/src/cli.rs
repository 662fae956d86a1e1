use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "catdiff",
    about = "catdiff: canonical comparison and page-widget validation across catalog environments",
    version
)]
pub struct Cli {
    /// Path to a TOML config file (default: ./catdiff.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate page widgets of every environment against its blueprints
    ValidatePages {
        /// Directory holding one subdirectory per environment
        #[arg(long)]
        output_dir: Option<String>,

        /// Validate only this environment
        #[arg(long)]
        env: Option<String>,

        /// Path of the results file (default: <output-dir>/page_validation_results.json)
        #[arg(long)]
        results: Option<String>,

        /// Log every widget and property verdict
        #[arg(long)]
        verbose: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Canonicalize an item array file
    Normalize {
        /// Item array JSON file
        input: String,

        /// Item type label used by scoped exclusion rules (e.g. Actions)
        #[arg(long)]
        item_type: String,

        /// Write here instead of rewriting the input file
        #[arg(long)]
        out: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the same item type across two environment exports
    Compare {
        /// Source (e.g. dev) item array JSON file
        #[arg(long)]
        source: String,

        /// Destination (e.g. prod) item array JSON file
        #[arg(long)]
        destination: String,

        /// Item type label used by scoped exclusion rules
        #[arg(long)]
        item_type: String,

        /// Keep only items whose `type` equals this value
        #[arg(long)]
        type_filter: Option<String>,

        /// Ignore top-level `permissions` when comparing
        #[arg(long)]
        exclude_permissions: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
