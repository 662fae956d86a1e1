use crate::config::CatdiffConfig;
use catdiff_kernel::ItemType;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";
const VERBOSE_LOG_FILTER: &str = "info,catdiff_kernel=debug,catdiff_pages=debug,catdiff_cli=debug";

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn load_config_or_exit(path: Option<&str>) -> CatdiffConfig {
    CatdiffConfig::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn parse_item_type_or_exit(raw: &str) -> ItemType {
    raw.parse().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn read_json_file_or_exit(path: &str, label: &str) -> Value {
    catdiff_kernel::read_json(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {label}: {e}");
        std::process::exit(1);
    })
}

/// Item arrays must be JSON arrays; anything else ends the run.
pub fn item_array_or_exit(value: Value, path: &str, label: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => {
            eprintln!("error: {label} at {path} must be a JSON array");
            std::process::exit(1);
        }
    }
}

pub fn print_json_or_exit<T: Serialize + ?Sized>(payload: &T, label: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {label} payload: {err}");
        std::process::exit(2);
    });
    println!("{rendered}");
}
