use std::path::Path;

use anyhow::Context as _;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub relevance: RelevanceConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default)]
    pub base_url: String,

    /// `en*` renders English by default; anything else renders Chinese.
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    /// Minimum normalized score (0-100) a summary needs to be published.
    #[serde(default)]
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_console_level")]
    pub console_level: String,
}

fn default_output_dir() -> String {
    "site".to_string()
}
fn default_locale() -> String {
    "zh-CN".to_string()
}
fn default_console_level() -> String {
    "info".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            base_url: String::new(),
            locale: default_locale(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            console_level: default_console_level(),
        }
    }
}

impl PipelineConfig {
    /// Reads a YAML config; `${VAR}` in string values is replaced from the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("parse config: {}", path.display()))
    }

    /// Defaults when no path is given.
    pub fn load_optional(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut value: serde_yaml::Value = serde_yaml::from_str(yaml).context("parse yaml")?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").context("compile env pattern")?;
        expand_env(&mut value, &pattern);
        serde_yaml::from_value(value).context("deserialize config")
    }
}

fn expand_env(value: &mut serde_yaml::Value, pattern: &Regex) {
    match value {
        serde_yaml::Value::String(text) => {
            if pattern.is_match(text) {
                let expanded = pattern
                    .replace_all(text.as_str(), |caps: &regex::Captures<'_>| {
                        std::env::var(&caps[1]).unwrap_or_default()
                    })
                    .into_owned();
                *text = expanded;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                expand_env(item, pattern);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                expand_env(item, pattern);
            }
        }
        serde_yaml::Value::Tagged(tagged) => expand_env(&mut tagged.value, pattern),
        _ => {}
    }
}
