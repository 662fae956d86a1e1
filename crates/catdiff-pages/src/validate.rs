//! Page validation orchestration.

use crate::error::{PagesError, json_kind};
use crate::registry::BlueprintRegistry;
use crate::report::{EnvironmentSummary, EnvironmentValidationResult, PageValidationResult, Violation};
use crate::resolve::{ValidationResult, ViolationType, resolve};
use crate::walker::{ExtractOptions, Location, Reference, RelatedToReference, extract};
use crate::widget::{blueprint_label, count_widgets, parse_widgets};
use serde_json::Value;

/// Validate every page of one environment against its registry.
pub fn validate_pages(
    pages: &[Value],
    registry: &BlueprintRegistry,
    options: &ExtractOptions,
) -> EnvironmentValidationResult {
    let mut result = EnvironmentValidationResult::default();
    for (index, page) in pages.iter().enumerate() {
        let identifier = page
            .get("identifier")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("#{index}"));
        let (page_result, partial) = validate_page(&identifier, page, registry, options);
        result.summary.absorb(&partial);
        result.pages.insert(identifier, page_result);
    }
    result
}

/// Validate a whole page export, which must be an array.
pub fn validate_pages_value(
    pages: &Value,
    registry: &BlueprintRegistry,
    options: &ExtractOptions,
) -> Result<EnvironmentValidationResult, PagesError> {
    let Some(rows) = pages.as_array() else {
        return Err(PagesError::PagesNotArray(json_kind(pages)));
    };
    Ok(validate_pages(rows, registry, options))
}

/// Validate one page, returning its result and its summary contribution.
pub fn validate_page(
    identifier: &str,
    page: &Value,
    registry: &BlueprintRegistry,
    options: &ExtractOptions,
) -> (PageValidationResult, EnvironmentSummary) {
    tracing::debug!(page = identifier, "validating page");
    let raw_widgets = page.get("widgets").filter(|widgets| widgets.is_array());
    let widgets = parse_widgets(raw_widgets);
    let mut result = PageValidationResult {
        page_title: page
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or(identifier)
            .to_string(),
        page_type: page
            .get("type")
            .and_then(Value::as_str)
            .filter(|page_type| !page_type.is_empty())
            .unwrap_or("unknown")
            .to_string(),
        widget_count: count_widgets(&widgets),
        violations: Vec::new(),
        warnings: Vec::new(),
    };

    if raw_widgets.is_none() {
        tracing::debug!(page = identifier, "page has no widgets, skipping");
        return (result, EnvironmentSummary::for_unvalidated_page());
    }

    for widget in &widgets {
        let extraction = extract(widget, identifier, options);
        for issue in extraction.issues {
            let mut violation = Violation::new(
                &issue.widget,
                Location::Dataset,
                ViolationType::AmbiguousBlueprintContext,
                issue.message,
            );
            violation.blueprint_ids = issue.blueprint_ids;
            result.violations.push(violation);
        }
        for reference in &extraction.references {
            route(reference, registry, &mut result);
        }
    }

    if result.has_findings() {
        tracing::info!(
            page = identifier,
            violations = result.violations.len(),
            warnings = result.warnings.len(),
            "page has findings"
        );
    }
    let partial = EnvironmentSummary::for_page(&result);
    (result, partial)
}

fn route(reference: &Reference, registry: &BlueprintRegistry, page: &mut PageValidationResult) {
    let reference = match reference {
        Reference::RelatedTo(related) => {
            if let Some(violation) = validate_related_to(related, registry) {
                page.violations.push(violation);
            }
            return;
        }
        Reference::Property(reference) => reference,
    };

    let verdict = resolve(&reference.property, &reference.blueprint_id, registry);
    tracing::debug!(
        property = %reference.property,
        blueprint = %reference.blueprint_id,
        location = reference.location.as_str(),
        verdict = verdict.violation_type().map_or("valid", |kind| kind.as_str()),
        "property checked"
    );

    let (violation_type, message, details, is_warning) = match verdict {
        ValidationResult::Valid { .. } | ValidationResult::Skipped { .. } => return,
        ValidationResult::Warning {
            violation_type,
            message,
        } => (violation_type, message, None, true),
        ValidationResult::Invalid {
            violation_type,
            message,
            details,
        } => (violation_type, message, details, false),
    };
    let mut violation = Violation::new(
        &reference.widget,
        reference.location,
        violation_type,
        message,
    );
    violation.blueprint_identifier = Some(reference.blueprint_id.clone());
    violation.invalid_property = Some(reference.property.clone());
    violation.rule_nesting_level = reference.nesting_level;
    violation.details = details;
    if is_warning {
        page.warnings.push(violation);
    } else {
        page.violations.push(violation);
    }
}

/// Check a `relatedTo` rule: the target must exist and the source must have
/// a relation pointing at it. A target that is not a string never exists. A
/// source missing from the registry, or not a string, is not reported here.
pub fn validate_related_to(
    reference: &RelatedToReference,
    registry: &BlueprintRegistry,
) -> Option<Violation> {
    let source = blueprint_label(&reference.source_blueprint_id);
    let target = blueprint_label(&reference.target_blueprint_id);
    let known_target = reference
        .target_blueprint_id
        .as_str()
        .filter(|target| registry.contains(target));
    let (violation_type, message) = if let Some(known_target) = known_target {
        let blueprint = registry.get(reference.source_blueprint_id.as_str()?)?;
        if blueprint.relates_to(known_target) {
            return None;
        }
        (
            ViolationType::MissingRelation,
            format!("No relation from blueprint \"{source}\" to \"{target}\" found"),
        )
    } else {
        (
            ViolationType::MissingBlueprint,
            format!("Target blueprint \"{target}\" in relatedTo operator not found in registry"),
        )
    };
    let mut violation = Violation::new(
        &reference.widget,
        reference.location,
        violation_type,
        message,
    );
    violation.blueprint_identifier = Some(reference.source_blueprint_id.clone());
    violation.invalid_property = Some(Value::String(format!("relatedTo: {target}")));
    violation.rule_nesting_level = Some(reference.nesting_level);
    Some(violation)
}
