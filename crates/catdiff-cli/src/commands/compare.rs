use crate::config::CatdiffConfig;
use crate::support::{
    item_array_or_exit, parse_item_type_or_exit, print_json_or_exit, read_json_file_or_exit,
};
use catdiff_kernel::{CompareOptions, ComparisonStatus, compare_items};
use serde_json::json;

pub struct Args {
    pub source: String,
    pub destination: String,
    pub item_type: String,
    pub type_filter: Option<String>,
    pub exclude_permissions: bool,
    pub json: bool,
}

pub fn run(config: &CatdiffConfig, args: Args) {
    let item_type = parse_item_type_or_exit(&args.item_type);
    let source = item_array_or_exit(
        read_json_file_or_exit(&args.source, "source items"),
        &args.source,
        "source items",
    );
    let destination = item_array_or_exit(
        read_json_file_or_exit(&args.destination, "destination items"),
        &args.destination,
        "destination items",
    );
    let options = CompareOptions {
        type_filter: args.type_filter.clone(),
        exclude_permissions: args.exclude_permissions,
    };
    let comparison = compare_items(
        &source,
        &destination,
        &config.exclusion_policy(),
        Some(item_type.label()),
        &options,
    )
    .unwrap_or_else(|e| {
        eprintln!("error: failed to compare {item_type}: {e}");
        std::process::exit(1);
    });
    tracing::info!(
        item_type = item_type.label(),
        total = comparison.summary.total,
        different = comparison.summary.different,
        "items compared"
    );

    if args.json {
        print_json_or_exit(
            &json!({
                "sourcePath": args.source,
                "destinationPath": args.destination,
                "options": options,
                "comparison": comparison,
            }),
            "compare",
        );
        return;
    }

    let summary = &comparison.summary;
    println!("catdiff compare");
    println!("  Item type: {item_type}");
    println!("  Source: {}", args.source);
    println!("  Destination: {}", args.destination);
    println!(
        "  Items: {} total, {} identical, {} different, {} only in source, {} only in destination",
        summary.total,
        summary.identical,
        summary.different,
        summary.only_in_source,
        summary.only_in_destination,
    );
    for entry in &comparison.entries {
        match entry.status {
            ComparisonStatus::Identical => {}
            ComparisonStatus::Different => println!(
                "  - {} [{}]: {}",
                entry.identifier,
                entry.status.as_str(),
                entry.changed_keys.join(", ")
            ),
            ComparisonStatus::OnlyInSource | ComparisonStatus::OnlyInDestination => {
                println!("  - {} [{}]", entry.identifier, entry.status.as_str());
            }
        }
    }
}
