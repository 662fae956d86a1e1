use crate::config::CatdiffConfig;
use crate::support::{
    item_array_or_exit, parse_item_type_or_exit, print_json_or_exit, read_json_file_or_exit,
};
use catdiff_kernel::{normalize_items, write_json_atomic};
use serde_json::json;

pub fn run(
    config: &CatdiffConfig,
    input: String,
    item_type: String,
    out: Option<String>,
    json_output: bool,
) {
    let item_type = parse_item_type_or_exit(&item_type);
    let items = item_array_or_exit(
        read_json_file_or_exit(&input, "item array"),
        &input,
        "item array",
    );
    let policy = config.exclusion_policy();
    let normalized = normalize_items(&items, &policy, Some(item_type.label())).unwrap_or_else(|e| {
        eprintln!("error: failed to normalize {input}: {e}");
        std::process::exit(1);
    });

    let output = out.unwrap_or_else(|| input.clone());
    if let Err(e) = write_json_atomic(&output, &normalized) {
        eprintln!("error: failed to write {output}: {e}");
        std::process::exit(1);
    }
    tracing::info!(
        item_type = item_type.label(),
        items = normalized.len(),
        output = %output,
        "items normalized"
    );

    if json_output {
        print_json_or_exit(
            &json!({
                "itemType": item_type.label(),
                "input": input,
                "output": output,
                "items": normalized.len(),
                "excludedKeys": policy.len(),
            }),
            "normalize",
        );
        return;
    }

    println!("catdiff normalize");
    println!("  Item type: {item_type}");
    println!("  Input: {input}");
    println!("  Output: {output}");
    println!("  Items: {}", normalized.len());
}
