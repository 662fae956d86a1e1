//! Widget tree walker.
//!
//! Turns one widget (and every widget nested inside it) into the property
//! references it makes and the context issues found along the way. Nothing
//! is resolved here; the orchestrator checks references against the
//! registry.

use crate::resolve::{RELATION_PATH_PREFIX, has_template_variables};
use crate::widget::{DatasetRule, Widget, WidgetKind, blueprint_label};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where in a widget document a reference was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "dataset")]
    Dataset,
    #[serde(rename = "dataset.rules")]
    DatasetRules,
    #[serde(rename = "dataset.rules.relation")]
    DatasetRulesRelation,
    #[serde(rename = "dataset.rules.relatedTo")]
    DatasetRulesRelatedTo,
    #[serde(rename = "blueprintConfig.filterSettings")]
    FilterSettings,
    #[serde(rename = "blueprintConfig.sortSettings")]
    SortSettings,
    #[serde(rename = "blueprintConfig.propertiesSettings")]
    PropertiesSettings,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Dataset => "dataset",
            Location::DatasetRules => "dataset.rules",
            Location::DatasetRulesRelation => "dataset.rules.relation",
            Location::DatasetRulesRelatedTo => "dataset.rules.relatedTo",
            Location::FilterSettings => "blueprintConfig.filterSettings",
            Location::SortSettings => "blueprintConfig.sortSettings",
            Location::PropertiesSettings => "blueprintConfig.propertiesSettings",
        }
    }
}

/// How `{relation, targetProperty}` dataset rules are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationRuleMode {
    /// `targetProperty` is looked up on the rule's own blueprint context.
    #[default]
    AsObserved,
    /// `targetProperty` is looked up on the relation's target blueprint,
    /// as the path `$relations.<relation>.<targetProperty>`.
    RelationTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub relation_rule_mode: RelationRuleMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetContext {
    pub widget_id: Option<Value>,
    pub widget_type: Option<String>,
    pub widget_title: String,
}

impl WidgetContext {
    fn of(widget: &Widget) -> Self {
        Self {
            widget_id: widget.id.clone(),
            widget_type: widget.widget_type.clone(),
            widget_title: widget.title_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReference {
    /// Raw property as authored; not necessarily a string.
    pub property: Value,
    /// Blueprint context the property is checked against. Raw, so a context
    /// that is not a string can be reported.
    pub blueprint_id: Value,
    pub location: Location,
    /// Rule depth; `None` outside rule lists.
    pub nesting_level: Option<usize>,
    pub widget: WidgetContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedToReference {
    pub source_blueprint_id: Value,
    /// Raw truthy `blueprint` of the rule.
    pub target_blueprint_id: Value,
    pub location: Location,
    pub nesting_level: usize,
    pub widget: WidgetContext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Property(PropertyReference),
    RelatedTo(RelatedToReference),
}

impl Reference {
    pub fn widget(&self) -> &WidgetContext {
        match self {
            Reference::Property(reference) => &reference.widget,
            Reference::RelatedTo(reference) => &reference.widget,
        }
    }
}

/// A widget whose blueprint context cannot be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousContext {
    pub widget: WidgetContext,
    pub blueprint_ids: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub references: Vec<Reference>,
    pub issues: Vec<AmbiguousContext>,
}

impl Extraction {
    fn append(&mut self, mut other: Extraction) {
        self.references.append(&mut other.references);
        self.issues.append(&mut other.issues);
    }
}

/// Extract references from `widget` and all widgets nested inside it.
pub fn extract(widget: &Widget, page_id: &str, options: &ExtractOptions) -> Extraction {
    tracing::debug!(
        page = page_id,
        widget = ?widget.id,
        widget_type = widget.widget_type.as_deref().unwrap_or_default(),
        "processing widget"
    );

    let context = WidgetContext::of(widget);
    let mut extraction = Extraction::default();

    let mut blueprint_context = widget.blueprint.clone();
    let mut candidates: Vec<String> = widget.blueprint.iter().map(blueprint_label).collect();
    candidates.extend(
        widget
            .blueprint_config
            .iter()
            .map(|entry| entry.blueprint_id.clone()),
    );

    match &widget.kind {
        WidgetKind::RunLog {
            query_blueprint: Some(query_blueprint),
            ..
        } => {
            blueprint_context = Some(Value::String(query_blueprint.clone()));
            if !has_template_variables(query_blueprint) {
                candidates.push(query_blueprint.clone());
            }
        }
        WidgetKind::EntitiesExplorer {
            dataset: Some(dataset),
            ..
        } => {
            let dataset_pins_blueprint = dataset.rules.iter().any(DatasetRule::pins_blueprint);
            if candidates.len() > 1 && blueprint_context.is_none() && !dataset_pins_blueprint {
                extraction.issues.push(AmbiguousContext {
                    widget: context.clone(),
                    message: format!(
                        "Widget has multiple blueprint configurations ({}) but dataset doesn't specify which blueprint applies",
                        candidates.join(", ")
                    ),
                    blueprint_ids: candidates.clone(),
                });
            }
            if blueprint_context.is_none() {
                blueprint_context = dataset
                    .rules
                    .iter()
                    .find_map(DatasetRule::pinned_blueprint)
                    .cloned();
            }
            if let Some(blueprint_id) = &blueprint_context {
                let rules = RuleScope {
                    blueprint_id,
                    location: None,
                    widget: &context,
                    options,
                };
                rules.collect(&dataset.rules, 0, &mut extraction.references);
            }
        }
        _ => {}
    }

    for entry in &widget.blueprint_config {
        let Some(settings) = &entry.settings else {
            continue;
        };
        let blueprint_id = Value::String(entry.blueprint_id.clone());
        let filter = RuleScope {
            blueprint_id: &blueprint_id,
            location: Some(Location::FilterSettings),
            widget: &context,
            options,
        };
        filter.collect(&settings.filter_rules, 0, &mut extraction.references);

        for property in &settings.sort_properties {
            extraction.references.push(Reference::Property(PropertyReference {
                property: property.clone(),
                blueprint_id: blueprint_id.clone(),
                location: Location::SortSettings,
                nesting_level: None,
                widget: context.clone(),
            }));
        }
        for property in settings
            .properties_order
            .iter()
            .chain(&settings.properties_shown)
        {
            extraction.references.push(Reference::Property(PropertyReference {
                property: Value::String(property.clone()),
                blueprint_id: blueprint_id.clone(),
                location: Location::PropertiesSettings,
                nesting_level: None,
                widget: context.clone(),
            }));
        }
    }

    for child in widget.children() {
        extraction.append(extract(child, page_id, options));
    }

    extraction
}

/// Convenience for raw widget documents; non-objects extract nothing.
pub fn extract_value(raw: &Value, page_id: &str, options: &ExtractOptions) -> Extraction {
    Widget::from_value(raw)
        .map(|widget| extract(&widget, page_id, options))
        .unwrap_or_default()
}

/// Rule extraction under one blueprint context. A fixed `location` overrides
/// the per-rule dataset locations, as filter settings do.
struct RuleScope<'a> {
    blueprint_id: &'a Value,
    location: Option<Location>,
    widget: &'a WidgetContext,
    options: &'a ExtractOptions,
}

impl RuleScope<'_> {
    fn collect(&self, rules: &[DatasetRule], level: usize, out: &mut Vec<Reference>) {
        for rule in rules {
            let leaf = match rule {
                DatasetRule::Group { rules, .. } => {
                    self.collect(rules, level + 1, out);
                    continue;
                }
                DatasetRule::Leaf(leaf) => leaf,
            };

            if let Some(property) = &leaf.property {
                out.push(self.property(property.clone(), Location::DatasetRules, level));
            }
            if let (Some(relation), Some(target_property)) = (&leaf.relation, &leaf.target_property)
            {
                let property = match (self.options.relation_rule_mode, relation, target_property) {
                    (
                        RelationRuleMode::RelationTarget,
                        Value::String(relation),
                        Value::String(target_property),
                    ) => Value::String(format!(
                        "{RELATION_PATH_PREFIX}{relation}.{target_property}"
                    )),
                    _ => target_property.clone(),
                };
                out.push(self.property(property, Location::DatasetRulesRelation, level));
            }
            if leaf.operator.as_deref() == Some("relatedTo")
                && let Some(target) = &leaf.blueprint
            {
                out.push(Reference::RelatedTo(RelatedToReference {
                    source_blueprint_id: self.blueprint_id.clone(),
                    target_blueprint_id: target.clone(),
                    location: self.location.unwrap_or(Location::DatasetRulesRelatedTo),
                    nesting_level: level,
                    widget: self.widget.clone(),
                }));
            }
        }
    }

    fn property(&self, property: Value, location: Location, level: usize) -> Reference {
        Reference::Property(PropertyReference {
            property,
            blueprint_id: self.blueprint_id.clone(),
            location: self.location.unwrap_or(location),
            nesting_level: Some(level),
            widget: self.widget.clone(),
        })
    }
}
