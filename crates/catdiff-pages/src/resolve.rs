//! Property and relation path resolution.
//!
//! A widget reference names a property path evaluated against a blueprint.
//! Paths come in four shapes: simple names, `$relations.`-prefixed multi-hop
//! relation chains, complex paths (brackets, or dots outside a relation
//! chain) that only a human can check, and template placeholders that are
//! filled in at runtime.

use crate::registry::BlueprintRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RELATION_PATH_PREFIX: &str = "$relations.";
pub const SKIP_REASON_TEMPLATE_VARIABLE: &str = "template_variable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    InvalidProperty,
    MissingBlueprint,
    MissingRelation,
    MissingRelationTargetBlueprint,
    ComplexPropertyPath,
    AmbiguousBlueprintContext,
}

impl ViolationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::InvalidProperty => "invalid_property",
            ViolationType::MissingBlueprint => "missing_blueprint",
            ViolationType::MissingRelation => "missing_relation",
            ViolationType::MissingRelationTargetBlueprint => "missing_relation_target_blueprint",
            ViolationType::ComplexPropertyPath => "complex_property_path",
            ViolationType::AmbiguousBlueprintContext => "ambiguous_blueprint_context",
        }
    }
}

/// One traversed hop of a relation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationHop {
    pub relation: String,
    pub target: String,
}

/// Diagnostics attached to a failed relation path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionDetails {
    /// Index of the failing hop in the relation chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_step: Option<usize>,
    /// Blueprint on which the failing hop was looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blueprint_id: Option<String>,
    /// Blueprint the final property was looked up on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_blueprint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relation_chain: Vec<RelationHop>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid {
        /// Hops traversed; empty for simple properties.
        relation_chain: Vec<RelationHop>,
    },
    Skipped {
        reason: &'static str,
    },
    /// Not a definite error; needs manual review.
    Warning {
        violation_type: ViolationType,
        message: String,
    },
    Invalid {
        violation_type: ViolationType,
        message: String,
        details: Option<ResolutionDetails>,
    },
}

impl ValidationResult {
    fn valid() -> Self {
        ValidationResult::Valid {
            relation_chain: Vec::new(),
        }
    }

    fn invalid(violation_type: ViolationType, message: String) -> Self {
        ValidationResult::Invalid {
            violation_type,
            message,
            details: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            ValidationResult::Valid { .. } | ValidationResult::Skipped { .. }
        )
    }

    pub fn violation_type(&self) -> Option<ViolationType> {
        match self {
            ValidationResult::Warning { violation_type, .. }
            | ValidationResult::Invalid { violation_type, .. } => Some(*violation_type),
            ValidationResult::Valid { .. } | ValidationResult::Skipped { .. } => None,
        }
    }
}

pub fn has_template_variables(path: &str) -> bool {
    path.contains("{{") || path.contains("}}")
}

fn not_a_property() -> ValidationResult {
    ValidationResult::invalid(
        ViolationType::InvalidProperty,
        "Property must be a non-empty string".to_string(),
    )
}

fn not_a_blueprint() -> ValidationResult {
    ValidationResult::invalid(
        ViolationType::MissingBlueprint,
        "Blueprint ID must be a non-empty string".to_string(),
    )
}

pub fn is_complex_property_path(path: &str) -> bool {
    path.contains('[')
        || path.contains(']')
        || (path.contains('.') && !path.starts_with(RELATION_PATH_PREFIX))
}

/// Resolve a raw property against a raw blueprint context, both as found in
/// widget JSON.
pub fn resolve(property: &Value, blueprint_id: &Value, registry: &BlueprintRegistry) -> ValidationResult {
    let Some(path) = property.as_str().filter(|path| !path.is_empty()) else {
        return not_a_property();
    };
    let Some(blueprint_id) = blueprint_id.as_str() else {
        return not_a_blueprint();
    };
    resolve_path(path, blueprint_id, registry)
}

/// Resolve a property path against `blueprint_id`. First matching rule wins:
/// input checks, template bypass, complex-path warning, relation chain,
/// simple property.
pub fn resolve_path(path: &str, blueprint_id: &str, registry: &BlueprintRegistry) -> ValidationResult {
    if path.is_empty() {
        return not_a_property();
    }
    if blueprint_id.is_empty() {
        return not_a_blueprint();
    }
    if has_template_variables(path) {
        return ValidationResult::Skipped {
            reason: SKIP_REASON_TEMPLATE_VARIABLE,
        };
    }
    if is_complex_property_path(path) {
        return ValidationResult::Warning {
            violation_type: ViolationType::ComplexPropertyPath,
            message: "Manual review needed for complex property path".to_string(),
        };
    }
    if path.starts_with(RELATION_PATH_PREFIX) {
        return resolve_relation_path(path, blueprint_id, registry);
    }
    resolve_simple(path, blueprint_id, registry)
}

fn resolve_simple(path: &str, blueprint_id: &str, registry: &BlueprintRegistry) -> ValidationResult {
    let Some(blueprint) = registry.get(blueprint_id) else {
        return ValidationResult::invalid(
            ViolationType::MissingBlueprint,
            format!("Blueprint \"{blueprint_id}\" not found in registry"),
        );
    };
    // Tables may display relations as columns, so relation names count too.
    if !blueprint.has_property(path) && blueprint.relation_target(path).is_none() {
        return ValidationResult::invalid(
            ViolationType::InvalidProperty,
            format!("Property \"{path}\" does not exist on blueprint \"{blueprint_id}\""),
        );
    }
    ValidationResult::valid()
}

fn resolve_relation_path(
    path: &str,
    source_blueprint_id: &str,
    registry: &BlueprintRegistry,
) -> ValidationResult {
    let segments: Vec<&str> = path.split('.').skip(1).collect();
    let Some((property, hops)) = segments.split_last().filter(|_| segments.len() >= 2) else {
        return ValidationResult::invalid(
            ViolationType::InvalidProperty,
            "Relation path must have at least relation name and property".to_string(),
        );
    };

    let mut current = source_blueprint_id.to_string();
    let mut relation_chain = Vec::with_capacity(hops.len());
    for (step, relation) in hops.iter().enumerate() {
        let Some(blueprint) = registry.get(&current) else {
            return ValidationResult::Invalid {
                violation_type: ViolationType::MissingBlueprint,
                message: format!("Blueprint \"{current}\" not found in registry"),
                details: Some(ResolutionDetails {
                    at_step: Some(step),
                    relation_chain,
                    ..ResolutionDetails::default()
                }),
            };
        };
        let Some(target) = blueprint.relation_target(relation) else {
            return ValidationResult::Invalid {
                violation_type: ViolationType::MissingRelation,
                message: format!(
                    "Relation \"{relation}\" does not exist on blueprint \"{current}\""
                ),
                details: Some(ResolutionDetails {
                    at_step: Some(step),
                    blueprint_id: Some(current),
                    relation_chain,
                    ..ResolutionDetails::default()
                }),
            };
        };
        let target = target.to_string();
        relation_chain.push(RelationHop {
            relation: relation.to_string(),
            target: target.clone(),
        });
        current = target;
    }

    let Some(final_blueprint) = registry.get(&current) else {
        return ValidationResult::Invalid {
            violation_type: ViolationType::MissingRelationTargetBlueprint,
            message: format!("Target blueprint \"{current}\" not found in registry"),
            details: Some(ResolutionDetails {
                relation_chain,
                ..ResolutionDetails::default()
            }),
        };
    };
    if !final_blueprint.has_property(property) {
        return ValidationResult::Invalid {
            violation_type: ViolationType::InvalidProperty,
            message: format!("Property \"{property}\" does not exist on blueprint \"{current}\""),
            details: Some(ResolutionDetails {
                target_blueprint_id: Some(current),
                relation_chain,
                ..ResolutionDetails::default()
            }),
        };
    }
    ValidationResult::Valid { relation_chain }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_registry() -> BlueprintRegistry {
        BlueprintRegistry::build(&[
            json!({
                "identifier": "A",
                "schema": {"properties": {"name": {}}},
                "relations": {"rel1": {"target": "B"}, "dangling": {"target": "Ghost"}}
            }),
            json!({
                "identifier": "B",
                "relations": {"rel2": {"target": "C"}}
            }),
            json!({
                "identifier": "C",
                "schema": {"properties": {"p": {}}}
            }),
        ])
    }

    fn hop(relation: &str, target: &str) -> RelationHop {
        RelationHop {
            relation: relation.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn multi_hop_chain_resolves_and_reports_chain() {
        let result = resolve_path("$relations.rel1.rel2.p", "A", &chain_registry());
        assert_eq!(
            result,
            ValidationResult::Valid {
                relation_chain: vec![hop("rel1", "B"), hop("rel2", "C")]
            }
        );
    }

    #[test]
    fn undefined_hop_fails_at_its_step() {
        let result = resolve_path("$relations.rel1.relX.p", "A", &chain_registry());
        let ValidationResult::Invalid {
            violation_type,
            details: Some(details),
            ..
        } = result
        else {
            panic!("expected invalid result with details, got {result:?}");
        };
        assert_eq!(violation_type, ViolationType::MissingRelation);
        assert_eq!(details.at_step, Some(1));
        assert_eq!(details.blueprint_id.as_deref(), Some("B"));
        assert_eq!(details.relation_chain, vec![hop("rel1", "B")]);
    }

    #[test]
    fn missing_source_blueprint_fails_at_step_zero() {
        let result = resolve_path("$relations.rel1.p", "Nope", &chain_registry());
        let ValidationResult::Invalid {
            violation_type,
            details: Some(details),
            ..
        } = result
        else {
            panic!("expected invalid result with details");
        };
        assert_eq!(violation_type, ViolationType::MissingBlueprint);
        assert_eq!(details.at_step, Some(0));
    }

    #[test]
    fn missing_final_blueprint_is_a_relation_target_violation() {
        let result = resolve_path("$relations.dangling.name", "A", &chain_registry());
        assert_eq!(
            result.violation_type(),
            Some(ViolationType::MissingRelationTargetBlueprint)
        );
    }

    #[test]
    fn unknown_final_property_names_target_blueprint() {
        let result = resolve_path("$relations.rel1.rel2.q", "A", &chain_registry());
        let ValidationResult::Invalid {
            violation_type,
            message,
            details: Some(details),
        } = result
        else {
            panic!("expected invalid result with details");
        };
        assert_eq!(violation_type, ViolationType::InvalidProperty);
        assert_eq!(message, "Property \"q\" does not exist on blueprint \"C\"");
        assert_eq!(details.target_blueprint_id.as_deref(), Some("C"));
        assert_eq!(details.relation_chain.len(), 2);
    }

    #[test]
    fn relation_path_needs_a_relation_and_a_property() {
        let result = resolve_path("$relations.rel1", "A", &chain_registry());
        assert_eq!(
            result,
            ValidationResult::Invalid {
                violation_type: ViolationType::InvalidProperty,
                message: "Relation path must have at least relation name and property"
                    .to_string(),
                details: None,
            }
        );
    }

    #[test]
    fn template_placeholders_are_skipped_regardless_of_registry() {
        let empty = BlueprintRegistry::default();
        for path in ["{{foo}}", "prefix {{ user.team }}", "odd}}"] {
            assert_eq!(
                resolve_path(path, "Anything", &empty),
                ValidationResult::Skipped {
                    reason: SKIP_REASON_TEMPLATE_VARIABLE
                }
            );
        }
    }

    #[test]
    fn complex_paths_are_warnings() {
        let registry = chain_registry();
        for path in ["items[0]", "meta.owner", "$relations.rel1[0].p"] {
            let result = resolve_path(path, "A", &registry);
            assert!(
                matches!(
                    result,
                    ValidationResult::Warning {
                        violation_type: ViolationType::ComplexPropertyPath,
                        ..
                    }
                ),
                "{path} should be a complex-path warning, got {result:?}"
            );
        }
    }

    #[test]
    fn simple_paths_accept_properties_and_relation_names() {
        let registry = chain_registry();
        assert!(resolve_path("name", "A", &registry).is_valid());
        assert!(resolve_path("$identifier", "A", &registry).is_valid());
        assert!(resolve_path("rel1", "A", &registry).is_valid());
        assert_eq!(
            resolve_path("subtitle", "A", &registry).violation_type(),
            Some(ViolationType::InvalidProperty)
        );
        assert_eq!(
            resolve_path("name", "Missing", &registry).violation_type(),
            Some(ViolationType::MissingBlueprint)
        );
    }

    #[test]
    fn input_checks_come_first() {
        let registry = chain_registry();
        assert_eq!(
            resolve(&json!(42), &json!("A"), &registry).violation_type(),
            Some(ViolationType::InvalidProperty)
        );
        assert_eq!(
            resolve(&json!(42), &json!(["A"]), &registry).violation_type(),
            Some(ViolationType::InvalidProperty)
        );
        let non_string_context = resolve(&json!("name"), &json!(["A", "B"]), &registry);
        assert_eq!(
            non_string_context,
            ValidationResult::invalid(
                ViolationType::MissingBlueprint,
                "Blueprint ID must be a non-empty string".to_string()
            )
        );
        assert!(resolve(&json!("name"), &json!("A"), &registry).is_valid());
        assert_eq!(
            resolve_path("", "A", &registry).violation_type(),
            Some(ViolationType::InvalidProperty)
        );
        assert_eq!(
            resolve_path("{{x}}", "", &registry).violation_type(),
            Some(ViolationType::MissingBlueprint)
        );
    }
}
