//! Typed widget model.
//!
//! Widget documents are loosely shaped JSON. They are parsed once into a
//! closed set of variants keyed by `type`, and each variant keeps only the
//! fields the walker reads. Unknown widget types become [`WidgetKind::Other`].

use serde_json::{Map, Value};

pub const TABLE_ENTITIES_EXPLORER: &str = "table-entities-explorer";
pub const TABLE_ENTITIES_EXPLORER_BY_DIRECTION: &str = "table-entities-explorer-by-direction";
pub const GRAPH_ENTITIES_EXPLORER: &str = "graph-entities-explorer";
pub const DASHBOARD_WIDGET: &str = "dashboard-widget";
pub const GROUPER: &str = "grouper";
pub const RUNS_TABLE: &str = "runs-table";
pub const TABLE_AUDIT_LOG: &str = "table-audit-log";

pub const DEFAULT_WIDGET_TITLE: &str = "Untitled Widget";

/// Reserved rule property that pins a dataset to a blueprint.
pub const BLUEPRINT_META_PROPERTY: &str = "$blueprint";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerVariant {
    Table,
    TableByDirection,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogVariant {
    RunsTable,
    AuditLog,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    EntitiesExplorer {
        variant: ExplorerVariant,
        dataset: Option<Dataset>,
    },
    Dashboard {
        widgets: Vec<Widget>,
    },
    Grouper {
        groups: Vec<Vec<Widget>>,
    },
    RunLog {
        variant: RunLogVariant,
        query_blueprint: Option<String>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// Raw `id` as authored; numbers are kept as numbers.
    pub id: Option<Value>,
    pub widget_type: Option<String>,
    pub title: Option<String>,
    /// Raw truthy `blueprint`; a non-string still sets the context.
    pub blueprint: Option<Value>,
    /// Entries of `blueprintConfig`, in document key order.
    pub blueprint_config: Vec<BlueprintConfigEntry>,
    pub kind: WidgetKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintConfigEntry {
    pub blueprint_id: String,
    /// `None` when the entry value is null or otherwise falsy.
    pub settings: Option<BlueprintSettings>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlueprintSettings {
    /// `filterSettings.filterBy.rules`
    pub filter_rules: Vec<DatasetRule>,
    /// `sortSettings.sortBy[].property`, raw and truthy.
    pub sort_properties: Vec<Value>,
    /// `propertiesSettings.order`
    pub properties_order: Vec<String>,
    /// `propertiesSettings.shown`
    pub properties_shown: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rules: Vec<DatasetRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRule {
    /// A combinator holding nested rules. Its own fields only take part in
    /// top-level blueprint pinning and are never references.
    Group {
        fields: RuleLeaf,
        rules: Vec<DatasetRule>,
    },
    Leaf(RuleLeaf),
}

/// Fields of a single rule. Every `Value` here is truthy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleLeaf {
    pub property: Option<Value>,
    pub relation: Option<Value>,
    pub target_property: Option<Value>,
    pub operator: Option<String>,
    pub blueprint: Option<Value>,
    pub value: Option<Value>,
}

impl Widget {
    /// Parse a widget document. Returns `None` for non-object values.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let widget_type = string_field(obj, "type");
        let kind = match widget_type.as_deref() {
            Some(TABLE_ENTITIES_EXPLORER) => explorer(obj, ExplorerVariant::Table),
            Some(TABLE_ENTITIES_EXPLORER_BY_DIRECTION) => {
                explorer(obj, ExplorerVariant::TableByDirection)
            }
            Some(GRAPH_ENTITIES_EXPLORER) => explorer(obj, ExplorerVariant::Graph),
            Some(DASHBOARD_WIDGET) => WidgetKind::Dashboard {
                widgets: parse_widgets(obj.get("widgets")),
            },
            Some(GROUPER) => WidgetKind::Grouper {
                groups: obj
                    .get("groups")
                    .and_then(Value::as_array)
                    .map(|groups| {
                        groups
                            .iter()
                            .filter(|group| group.get("widgets").is_some_and(Value::is_array))
                            .map(|group| parse_widgets(group.get("widgets")))
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            Some(RUNS_TABLE) => run_log(obj, RunLogVariant::RunsTable),
            Some(TABLE_AUDIT_LOG) => run_log(obj, RunLogVariant::AuditLog),
            _ => WidgetKind::Other,
        };

        let blueprint_config = obj
            .get("blueprintConfig")
            .and_then(Value::as_object)
            .map(|config| {
                config
                    .iter()
                    .map(|(blueprint_id, settings)| BlueprintConfigEntry {
                        blueprint_id: blueprint_id.clone(),
                        settings: is_truthy(settings).then(|| BlueprintSettings::from_value(settings)),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id: obj.get("id").filter(|id| !id.is_null()).cloned(),
            widget_type,
            title: string_field(obj, "title"),
            blueprint: truthy_field(raw, "blueprint"),
            blueprint_config,
            kind,
        })
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_WIDGET_TITLE)
    }

    /// Direct children of composite widgets, flattened across groups.
    pub fn children(&self) -> Vec<&Widget> {
        match &self.kind {
            WidgetKind::Dashboard { widgets } => widgets.iter().collect(),
            WidgetKind::Grouper { groups } => groups.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }
}

impl BlueprintSettings {
    fn from_value(raw: &Value) -> Self {
        let filter_rules = raw
            .pointer("/filterSettings/filterBy/rules")
            .map(parse_rules)
            .unwrap_or_default();
        let sort_properties = raw
            .pointer("/sortSettings/sortBy")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| truthy_field(item, "property"))
                    .collect()
            })
            .unwrap_or_default();
        let settings_list = |key: &str| -> Vec<String> {
            raw.get("propertiesSettings")
                .and_then(|settings| settings.get(key))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter(|name| !name.is_empty())
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default()
        };
        Self {
            filter_rules,
            sort_properties,
            properties_order: settings_list("order"),
            properties_shown: settings_list("shown"),
        }
    }
}

impl DatasetRule {
    fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let fields = RuleLeaf {
            property: truthy_field(raw, "property"),
            relation: truthy_field(raw, "relation"),
            target_property: truthy_field(raw, "targetProperty"),
            operator: string_field(obj, "operator"),
            blueprint: truthy_field(raw, "blueprint"),
            value: truthy_field(raw, "value"),
        };
        match obj.get("rules") {
            Some(nested) if nested.is_array() => Some(DatasetRule::Group {
                fields,
                rules: parse_rules(nested),
            }),
            _ => Some(DatasetRule::Leaf(fields)),
        }
    }

    /// The rule's own fields; for a group, those of the container.
    pub fn fields(&self) -> &RuleLeaf {
        match self {
            DatasetRule::Group { fields, .. } | DatasetRule::Leaf(fields) => fields,
        }
    }

    /// Whether this rule, taken at top level, says which blueprint the
    /// dataset targets.
    pub fn pins_blueprint(&self) -> bool {
        let fields = self.fields();
        fields.tests_blueprint() || fields.blueprint.is_some()
    }

    /// The raw value of a `$blueprint` rule, if this is one. It is not
    /// necessarily a string.
    pub fn pinned_blueprint(&self) -> Option<&Value> {
        let fields = self.fields();
        if !fields.tests_blueprint() {
            return None;
        }
        fields.value.as_ref()
    }
}

impl RuleLeaf {
    fn tests_blueprint(&self) -> bool {
        self.property.as_ref().and_then(Value::as_str) == Some(BLUEPRINT_META_PROPERTY)
    }
}

/// JavaScript truthiness, which is how widget documents are authored.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text of a blueprint id for messages. Strings print bare, anything else
/// as compact JSON.
pub fn blueprint_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Count widgets recursively, including nested dashboard and grouper children.
pub fn count_widgets(widgets: &[Widget]) -> usize {
    widgets
        .iter()
        .map(|widget| 1 + count_widgets_in(widget))
        .sum()
}

fn count_widgets_in(widget: &Widget) -> usize {
    widget
        .children()
        .into_iter()
        .map(|child| 1 + count_widgets_in(child))
        .sum()
}

pub fn parse_widgets(raw: Option<&Value>) -> Vec<Widget> {
    raw.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Widget::from_value).collect())
        .unwrap_or_default()
}

fn parse_rules(raw: &Value) -> Vec<DatasetRule> {
    raw.as_array()
        .map(|items| items.iter().filter_map(DatasetRule::from_value).collect())
        .unwrap_or_default()
}

fn explorer(obj: &Map<String, Value>, variant: ExplorerVariant) -> WidgetKind {
    let dataset = obj
        .get("dataset")
        .filter(|dataset| is_truthy(dataset))
        .map(|dataset| Dataset {
            rules: dataset.get("rules").map(parse_rules).unwrap_or_default(),
        });
    WidgetKind::EntitiesExplorer { variant, dataset }
}

fn run_log(obj: &Map<String, Value>, variant: RunLogVariant) -> WidgetKind {
    WidgetKind::RunLog {
        variant,
        query_blueprint: obj
            .get("query")
            .and_then(|query| query.get("blueprint"))
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn truthy_field(raw: &Value, key: &str) -> Option<Value> {
    raw.get(key).filter(|value| is_truthy(value)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatches_on_type() {
        let explorer = Widget::from_value(&json!({
            "id": "w1",
            "type": "graph-entities-explorer",
            "dataset": {"combinator": "and", "rules": [{"property": "title"}]}
        }))
        .expect("object widget");
        let WidgetKind::EntitiesExplorer { variant, dataset } = &explorer.kind else {
            panic!("expected explorer, got {:?}", explorer.kind);
        };
        assert_eq!(*variant, ExplorerVariant::Graph);
        assert_eq!(dataset.as_ref().map(|d| d.rules.len()), Some(1));

        let runs = Widget::from_value(&json!({
            "type": "runs-table",
            "query": {"blueprint": "service"}
        }))
        .expect("object widget");
        assert_eq!(
            runs.kind,
            WidgetKind::RunLog {
                variant: RunLogVariant::RunsTable,
                query_blueprint: Some("service".to_string())
            }
        );

        let markdown = Widget::from_value(&json!({"type": "markdown", "markdown": "# hi"}))
            .expect("object widget");
        assert_eq!(markdown.kind, WidgetKind::Other);
        assert_eq!(markdown.title_or_default(), DEFAULT_WIDGET_TITLE);
        assert!(Widget::from_value(&json!("not a widget")).is_none());
    }

    #[test]
    fn nested_rules_become_groups() {
        let rule = DatasetRule::from_value(&json!({
            "combinator": "or",
            "property": "ignored",
            "rules": [{"property": "a"}, {"relation": "owner", "targetProperty": "name"}]
        }))
        .expect("object rule");
        let DatasetRule::Group { fields, rules } = rule else {
            panic!("expected group");
        };
        assert_eq!(fields.property, Some(json!("ignored")));
        assert_eq!(rules.len(), 2);
        let DatasetRule::Leaf(leaf) = &rules[1] else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.relation, Some(json!("owner")));
        assert_eq!(leaf.target_property, Some(json!("name")));
    }

    #[test]
    fn falsy_rule_fields_are_dropped() {
        let rule = DatasetRule::from_value(&json!({
            "property": "",
            "blueprint": null,
            "value": 0,
            "operator": "="
        }))
        .expect("object rule");
        assert_eq!(
            rule,
            DatasetRule::Leaf(RuleLeaf {
                operator: Some("=".to_string()),
                ..RuleLeaf::default()
            })
        );
    }

    #[test]
    fn blueprint_pinning_rules() {
        let pinned = DatasetRule::from_value(&json!({
            "property": "$blueprint", "operator": "=", "value": "service"
        }))
        .expect("object rule");
        assert!(pinned.pins_blueprint());
        assert_eq!(pinned.pinned_blueprint(), Some(&json!("service")));

        let related = DatasetRule::from_value(&json!({
            "operator": "relatedTo", "blueprint": "team", "value": "t1"
        }))
        .expect("object rule");
        assert!(related.pins_blueprint());
        assert_eq!(related.pinned_blueprint(), None);

        let listed = DatasetRule::from_value(&json!({
            "property": "$blueprint", "operator": "in", "value": ["X", "Y"]
        }))
        .expect("object rule");
        assert!(listed.pins_blueprint());
        assert_eq!(listed.pinned_blueprint(), Some(&json!(["X", "Y"])));
    }

    #[test]
    fn group_containers_can_pin_the_blueprint() {
        let by_property = DatasetRule::from_value(&json!({
            "property": "$blueprint",
            "value": "service",
            "combinator": "and",
            "rules": [{"property": "tier"}]
        }))
        .expect("object rule");
        assert!(matches!(by_property, DatasetRule::Group { .. }));
        assert!(by_property.pins_blueprint());
        assert_eq!(by_property.pinned_blueprint(), Some(&json!("service")));

        let by_blueprint = DatasetRule::from_value(&json!({
            "blueprint": "team",
            "rules": []
        }))
        .expect("object rule");
        assert!(by_blueprint.pins_blueprint());
        assert_eq!(by_blueprint.pinned_blueprint(), None);

        let plain = DatasetRule::from_value(&json!({"combinator": "or", "rules": []}))
            .expect("object rule");
        assert!(!plain.pins_blueprint());
    }

    #[test]
    fn raw_widget_ids_and_blueprints_are_kept() {
        let widget = Widget::from_value(&json!({
            "id": 42,
            "type": "table-entities-explorer",
            "blueprint": {"id": "service"}
        }))
        .expect("object widget");
        assert_eq!(widget.id, Some(json!(42)));
        assert_eq!(widget.blueprint, Some(json!({"id": "service"})));

        let unnamed = Widget::from_value(&json!({"id": null, "blueprint": ""}))
            .expect("object widget");
        assert_eq!(unnamed.id, None);
        assert_eq!(unnamed.blueprint, None);
    }

    #[test]
    fn blueprint_labels() {
        assert_eq!(blueprint_label(&json!("team")), "team");
        assert_eq!(blueprint_label(&json!({"id": "Z"})), r#"{"id":"Z"}"#);
        assert_eq!(blueprint_label(&json!(["X", "Y"])), r#"["X","Y"]"#);
    }

    #[test]
    fn blueprint_config_keeps_null_entries_without_settings() {
        let widget = Widget::from_value(&json!({
            "type": "table-entities-explorer",
            "blueprintConfig": {
                "service": {
                    "filterSettings": {"filterBy": {"rules": [{"property": "tier"}]}},
                    "sortSettings": {"sortBy": [{"property": "name"}, {"order": "asc"}]},
                    "propertiesSettings": {"order": ["a", 3, ""], "shown": ["b"]}
                },
                "team": null
            }
        }))
        .expect("object widget");
        assert_eq!(widget.blueprint_config.len(), 2);
        let service = widget.blueprint_config[0]
            .settings
            .as_ref()
            .expect("service settings");
        assert_eq!(service.filter_rules.len(), 1);
        assert_eq!(service.sort_properties, vec![json!("name")]);
        assert_eq!(service.properties_order, vec!["a".to_string()]);
        assert_eq!(service.properties_shown, vec!["b".to_string()]);
        assert_eq!(widget.blueprint_config[1].blueprint_id, "team");
        assert!(widget.blueprint_config[1].settings.is_none());
    }

    #[test]
    fn counts_nested_widgets() {
        let widgets = parse_widgets(Some(&json!([
            {"type": "dashboard-widget", "widgets": [
                {"type": "markdown"},
                {"type": "grouper", "groups": [
                    {"widgets": [{"type": "markdown"}, {"type": "markdown"}]},
                    {"title": "empty group"}
                ]}
            ]},
            null,
            {"type": "markdown"}
        ])));
        assert_eq!(count_widgets(&widgets), 6);
    }

    #[test]
    fn truthiness_follows_document_conventions() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&value), "{value} should be falsy");
        }
        for value in [json!(true), json!(1), json!("x"), json!([]), json!({})] {
            assert!(is_truthy(&value), "{value} should be truthy");
        }
    }
}
