//! # catdiff Pages
//!
//! Static validation of dashboard pages: every property a widget reads is
//! checked against the blueprint schemas of the same environment.
//!
//! ## Architecture
//!
//! ```text
//! BlueprintRegistry::build   ← blueprint export, built once per environment
//!     │
//! Widget::from_value         ← typed widget variants
//!     │
//! walker::extract            ← references + ambiguous-context issues
//!     │
//! resolve / relatedTo check  ← verdict per reference
//!     │
//! validate_pages             ← per-page results merged into a summary
//! ```
//!
//! Everything here is pure and synchronous. Broken references are data in
//! the report, never errors; [`PagesError`] is reserved for inputs that are
//! not page or blueprint lists at all.

pub mod error;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod validate;
pub mod walker;
pub mod widget;

pub use error::PagesError;
pub use registry::{BlueprintDescriptor, BlueprintRegistry, META_PROPERTIES, SkippedBlueprint};
pub use report::{
    CommandLineArgs, EnvironmentSummary, EnvironmentValidationResult, PageValidationResult,
    ValidationReport, Violation,
};
pub use resolve::{
    RelationHop, ResolutionDetails, ValidationResult, ViolationType, resolve, resolve_path,
};
pub use validate::{validate_page, validate_pages, validate_pages_value, validate_related_to};
pub use walker::{
    AmbiguousContext, ExtractOptions, Extraction, Location, PropertyReference, Reference,
    RelatedToReference, RelationRuleMode, WidgetContext, extract, extract_value,
};
pub use widget::{Widget, WidgetKind, count_widgets};
