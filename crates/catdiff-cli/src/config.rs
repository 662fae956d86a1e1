//! `catdiff.toml`: exclusion overrides and validation defaults.

use catdiff_kernel::ExclusionPolicy;
use catdiff_kernel::exclusion::{SCOPED_KEYS, UNRESTRICTED_KEYS};
use catdiff_pages::RelationRuleMode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "catdiff.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_RESULTS_FILE: &str = "page_validation_results.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatdiffConfig {
    #[serde(default)]
    pub exclude: ExcludeConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
    /// Replaces the built-in unrestricted keys when present.
    pub keys: Option<Vec<String>>,
    /// Replaces the built-in scoped keys when present.
    pub scoped: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub extra: ExtraKeys,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtraKeys {
    #[serde(default)]
    pub keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    #[serde(default)]
    pub relation_rule_mode: RelationRuleMode,
    pub output_dir: Option<String>,
    pub results_file: Option<String>,
}

impl CatdiffConfig {
    /// Load `explicit`, or the default path when it exists.
    pub fn load(explicit: Option<&str>) -> Result<Self, String> {
        let path = match explicit {
            Some(path) => PathBuf::from(path),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        Self::read(&path)
    }

    fn read(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config at {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| format!("failed to parse config at {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        let mut policy = ExclusionPolicy::empty();
        match &self.exclude.keys {
            Some(keys) => {
                for key in keys {
                    policy.exclude(key.as_str());
                }
            }
            None => {
                for key in UNRESTRICTED_KEYS {
                    policy.exclude(*key);
                }
            }
        }
        match &self.exclude.scoped {
            Some(scoped) => {
                for (key, item_types) in scoped {
                    policy.exclude_for(key.as_str(), item_types.iter().map(String::as_str));
                }
            }
            None => {
                for (key, item_types) in SCOPED_KEYS {
                    policy.exclude_for(*key, item_types.iter().copied());
                }
            }
        }
        for key in &self.exclude.extra.keys {
            policy.exclude(key.as_str());
        }
        policy
    }

    pub fn output_dir(&self) -> &str {
        self.validate
            .output_dir
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_DIR)
    }

    /// Results path; a relative `results_file` lives under the output dir.
    pub fn results_path(&self, output_dir: &Path) -> PathBuf {
        let file = self
            .validate
            .results_file
            .as_deref()
            .unwrap_or(DEFAULT_RESULTS_FILE);
        let file = Path::new(file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            output_dir.join(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_builtin_policy() {
        let config = CatdiffConfig::default();
        assert_eq!(config.exclusion_policy(), ExclusionPolicy::builtin());
        assert_eq!(config.validate.relation_rule_mode, RelationRuleMode::AsObserved);
        assert_eq!(config.output_dir(), "output");
        assert_eq!(
            config.results_path(Path::new("output")),
            Path::new("output").join("page_validation_results.json")
        );
    }

    #[test]
    fn keys_replace_and_extra_appends() {
        let config: CatdiffConfig = toml::from_str(
            r#"
            [exclude]
            keys = ["_id"]

            [exclude.scoped]
            description = ["Pages", "Actions"]

            [exclude.extra]
            keys = ["permissions"]

            [validate]
            relation_rule_mode = "relation_target"
            "#,
        )
        .expect("config should parse");
        let policy = config.exclusion_policy();
        assert!(policy.should_exclude("_id", None));
        assert!(policy.should_exclude("permissions", Some("Webhooks")));
        assert!(!policy.should_exclude("createdAt", None));
        assert!(!policy.should_exclude("ownedByTeam", Some("Actions")));
        assert!(policy.should_exclude("description", Some("Pages")));
        assert!(!policy.should_exclude("description", Some("Blueprints")));
        assert_eq!(
            config.validate.relation_rule_mode,
            RelationRuleMode::RelationTarget
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml::from_str::<CatdiffConfig>("[exclude]\nkeyz = []\n")
            .expect_err("typo should fail");
        assert!(err.to_string().contains("keyz"));
    }
}
