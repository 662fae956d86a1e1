//! Report records.
//!
//! These types are the JSON contract of the validation results file. Field
//! names are camelCase to match the page and widget documents they describe.

use crate::resolve::{ResolutionDetails, ViolationType};
use crate::walker::{Location, WidgetContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One violation or warning found on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    pub widget_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_identifier: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_property: Option<Value>,
    pub location_type: Location,
    pub violation_type: ViolationType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_nesting_level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ResolutionDetails>,
    /// Candidate blueprints; only set on ambiguous-context violations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blueprint_ids: Vec<String>,
}

impl Violation {
    pub(crate) fn new(
        widget: &WidgetContext,
        location_type: Location,
        violation_type: ViolationType,
        message: String,
    ) -> Self {
        Self {
            widget_id: widget.widget_id.clone(),
            widget_type: widget.widget_type.clone(),
            widget_title: widget.widget_title.clone(),
            blueprint_identifier: None,
            invalid_property: None,
            location_type,
            violation_type,
            message,
            rule_nesting_level: None,
            details: None,
            blueprint_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageValidationResult {
    pub page_title: String,
    pub page_type: String,
    /// All widgets on the page, nested ones included.
    pub widget_count: usize,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
}

impl PageValidationResult {
    pub fn has_findings(&self) -> bool {
        !self.violations.is_empty() || !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSummary {
    pub total_pages: usize,
    pub pages_validated: usize,
    pub pages_with_errors: usize,
    pub pages_with_warnings: usize,
    pub total_violations: usize,
    pub total_warnings: usize,
    pub violations_by_type: BTreeMap<String, usize>,
    pub warnings_by_type: BTreeMap<String, usize>,
}

impl EnvironmentSummary {
    /// Partial summary for a page that was not validated (no widget list).
    pub fn for_unvalidated_page() -> Self {
        Self {
            total_pages: 1,
            ..Self::default()
        }
    }

    /// Partial summary for one validated page.
    pub fn for_page(page: &PageValidationResult) -> Self {
        let mut summary = Self {
            total_pages: 1,
            pages_validated: 1,
            pages_with_errors: usize::from(!page.violations.is_empty()),
            pages_with_warnings: usize::from(!page.warnings.is_empty()),
            total_violations: page.violations.len(),
            total_warnings: page.warnings.len(),
            ..Self::default()
        };
        for violation in &page.violations {
            *summary
                .violations_by_type
                .entry(violation.violation_type.as_str().to_string())
                .or_default() += 1;
        }
        for warning in &page.warnings {
            *summary
                .warnings_by_type
                .entry(warning.violation_type.as_str().to_string())
                .or_default() += 1;
        }
        summary
    }

    /// Merge another partial into this one. Commutative and associative.
    pub fn absorb(&mut self, other: &EnvironmentSummary) {
        self.total_pages += other.total_pages;
        self.pages_validated += other.pages_validated;
        self.pages_with_errors += other.pages_with_errors;
        self.pages_with_warnings += other.pages_with_warnings;
        self.total_violations += other.total_violations;
        self.total_warnings += other.total_warnings;
        for (kind, count) in &other.violations_by_type {
            *self.violations_by_type.entry(kind.clone()).or_default() += count;
        }
        for (kind, count) in &other.warnings_by_type {
            *self.warnings_by_type.entry(kind.clone()).or_default() += count;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentValidationResult {
    /// Keyed by page identifier.
    pub pages: BTreeMap<String, PageValidationResult>,
    pub summary: EnvironmentSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLineArgs {
    pub verbose: bool,
    pub env_filter: Option<String>,
}

/// The full results file: one entry per validated environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub command_line_args: CommandLineArgs,
    pub environments: BTreeMap<String, EnvironmentValidationResult>,
    /// Environment name to the reason it was not validated.
    #[serde(default)]
    pub skipped_environments: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn new(generated_at: DateTime<Utc>, command_line_args: CommandLineArgs) -> Self {
        Self {
            generated_at,
            command_line_args,
            environments: BTreeMap::new(),
            skipped_environments: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, environment: &str, result: EnvironmentValidationResult) {
        self.skipped_environments.remove(environment);
        self.environments.insert(environment.to_string(), result);
    }

    pub fn skip(&mut self, environment: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(environment, reason = %reason, "environment skipped");
        self.skipped_environments
            .insert(environment.to_string(), reason);
    }

    /// Violations across every validated environment.
    pub fn total_violations(&self) -> usize {
        self.environments
            .values()
            .map(|env| env.summary.total_violations)
            .sum()
    }
}
