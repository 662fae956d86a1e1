//! catdiff CLI: the `catdiff` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::ValidatePages { verbose: true, .. });
    support::init_tracing(verbose);
    let config = support::load_config_or_exit(cli.config.as_deref());

    match cli.command {
        Commands::ValidatePages {
            output_dir,
            env,
            results,
            verbose,
            json,
        } => commands::validate_pages::run(
            &config,
            commands::validate_pages::Args {
                output_dir,
                env,
                results,
                verbose,
                json,
            },
        ),

        Commands::Normalize {
            input,
            item_type,
            out,
            json,
        } => commands::normalize::run(&config, input, item_type, out, json),

        Commands::Compare {
            source,
            destination,
            item_type,
            type_filter,
            exclude_permissions,
            json,
        } => commands::compare::run(
            &config,
            commands::compare::Args {
                source,
                destination,
                item_type,
                type_filter,
                exclude_permissions,
                json,
            },
        ),
    }
}
