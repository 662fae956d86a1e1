use crate::config::CatdiffConfig;
use crate::support::print_json_or_exit;
use catdiff_kernel::{ItemType, read_json, write_json_atomic};
use catdiff_pages::{
    BlueprintRegistry, CommandLineArgs, EnvironmentSummary, EnvironmentValidationResult,
    ExtractOptions, ValidationReport, validate_pages_value,
};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Args {
    pub output_dir: Option<String>,
    pub env: Option<String>,
    pub results: Option<String>,
    pub verbose: bool,
    pub json: bool,
}

pub fn run(config: &CatdiffConfig, args: Args) {
    let output_dir = PathBuf::from(args.output_dir.as_deref().unwrap_or(config.output_dir()));
    let results_path = args
        .results
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.results_path(&output_dir));
    let options = ExtractOptions {
        relation_rule_mode: config.validate.relation_rule_mode,
    };
    tracing::info!(
        verbose = args.verbose,
        env = args.env.as_deref().unwrap_or("all"),
        "page validation started"
    );

    let environments = discover_environments(&output_dir, args.env.as_deref()).unwrap_or_else(|e| {
        eprintln!("error: failed to discover environments: {e}");
        std::process::exit(1);
    });
    tracing::info!(
        count = environments.len(),
        environments = %environments.join(", "),
        "environments discovered"
    );

    let mut report = ValidationReport::new(
        Utc::now(),
        CommandLineArgs {
            verbose: args.verbose,
            env_filter: args.env.clone(),
        },
    );
    for environment in &environments {
        match validate_environment(&output_dir.join(environment), &options) {
            Ok(result) => {
                log_summary(environment, &result.summary);
                report.record(environment, result);
            }
            Err(reason) => report.skip(environment, reason),
        }
    }

    if let Err(e) = write_json_atomic(&results_path, &report) {
        eprintln!("error: failed to write results: {e}");
        std::process::exit(1);
    }
    tracing::info!(path = %results_path.display(), "validation results written");

    if args.json {
        print_json_or_exit(&report, "validate-pages");
        return;
    }

    println!("catdiff validate-pages");
    println!("  Output dir: {}", output_dir.display());
    println!("  Results: {}", results_path.display());
    println!(
        "  Environments: {} validated, {} skipped",
        report.environments.len(),
        report.skipped_environments.len()
    );
    println!("  Violations: {}", report.total_violations());
    for (name, result) in &report.environments {
        let summary = &result.summary;
        println!(
            "  - {name}: {} pages validated, {} with errors, {} with warnings, {} violations, {} warnings",
            summary.pages_validated,
            summary.pages_with_errors,
            summary.pages_with_warnings,
            summary.total_violations,
            summary.total_warnings,
        );
    }
    for (name, reason) in &report.skipped_environments {
        println!("  - {name}: skipped ({reason})");
    }
}

/// Environment directories under `output_dir`, sorted by name.
fn discover_environments(output_dir: &Path, filter: Option<&str>) -> Result<Vec<String>, String> {
    let entries = fs::read_dir(output_dir).map_err(|e| format!("{}: {e}", output_dir.display()))?;
    let mut environments = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("{}: {e}", output_dir.display()))?;
        if entry.path().is_dir() {
            environments.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    environments.sort();

    let Some(wanted) = filter else {
        return Ok(environments);
    };
    if environments.iter().any(|name| name == wanted) {
        return Ok(vec![wanted.to_string()]);
    }
    Err(format!(
        "environment \"{wanted}\" not found in {}. Available: {}",
        output_dir.display(),
        environments.join(", ")
    ))
}

fn validate_environment(
    dir: &Path,
    options: &ExtractOptions,
) -> Result<EnvironmentValidationResult, String> {
    let blueprints_path = dir.join(ItemType::Blueprints.file_name());
    let pages_path = dir.join(ItemType::Pages.file_name());
    for path in [&blueprints_path, &pages_path] {
        if !path.exists() {
            return Err(format!("{} not found", file_label(path)));
        }
    }

    let blueprints = read_json(&blueprints_path).map_err(|e| e.to_string())?;
    let pages = read_json(&pages_path).map_err(|e| e.to_string())?;
    let registry = BlueprintRegistry::from_value(&blueprints).map_err(|e| e.to_string())?;
    tracing::info!(
        blueprints = registry.len(),
        skipped = registry.skipped().len(),
        pages = pages.as_array().map_or(0, Vec::len),
        "registry built"
    );
    validate_pages_value(&pages, &registry, options).map_err(|e| e.to_string())
}

fn log_summary(environment: &str, summary: &EnvironmentSummary) {
    tracing::info!(
        environment,
        pages_validated = summary.pages_validated,
        pages_with_errors = summary.pages_with_errors,
        pages_with_warnings = summary.pages_with_warnings,
        total_violations = summary.total_violations,
        total_warnings = summary.total_warnings,
        "environment validated"
    );
    for (kind, count) in &summary.violations_by_type {
        tracing::info!(environment, kind = kind.as_str(), count, "violations by type");
    }
    for (kind, count) in &summary.warnings_by_type {
        tracing::info!(environment, kind = kind.as_str(), count, "warnings by type");
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
