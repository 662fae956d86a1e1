//! # catdiff Kernel
//!
//! Makes configuration entities fetched from two catalog environments
//! comparable: a notion of "same entity" exists exactly when both sides,
//! after volatile keys are dropped and structure is put in canonical order,
//! serialize to the same bytes.
//!
//! This crate is **entity-agnostic**: it does not interpret blueprints,
//! pages, or widgets. Page-level validation lives in `catdiff-pages`.
//!
//! ## Architecture
//!
//! ```text
//! ExclusionPolicy       ← which keys are volatile, optionally per item type
//!     │
//! normalize             ← deep key sort, array classification, empty pruning
//!     │
//! normalize_items       ← item arrays sorted by `identifier`
//!     │
//! compare_items         ← per-identifier source/destination classification
//! ```

pub mod compare;
pub mod error;
pub mod exclusion;
pub mod item_type;
pub mod normalize;
pub mod store;

pub use compare::{
    CompareOptions, ComparisonEntry, ComparisonStatus, ComparisonSummary, ItemComparison,
    canonical_json, compare_items, stable_digest,
};
pub use error::CatalogError;
pub use exclusion::{ExclusionPolicy, KeyRestriction};
pub use item_type::ItemType;
pub use normalize::{ArrayShape, IDENTIFIER_KEY, classify_array, normalize, normalize_items};
pub use store::{read_json, write_json_atomic};
