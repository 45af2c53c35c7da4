use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level window shader configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShadeConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Window rule property whose value names the shader for a window.
    #[serde(default = "default_rule_property")]
    pub rule_property: String,
    /// Builtin shaders to load up front; `"all"` loads the whole catalog.
    #[serde(default = "default_builtins")]
    pub builtins: Vec<String>,
    #[serde(default)]
    pub shaders: BTreeMap<String, ShaderEntry>,
}

fn default_version() -> u32 {
    1
}

fn default_rule_property() -> String {
    "shade".to_string()
}

fn default_builtins() -> Vec<String> {
    vec!["all".to_string()]
}

impl Default for ShadeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            rule_property: default_rule_property(),
            builtins: default_builtins(),
            shaders: BTreeMap::new(),
        }
    }
}

/// A custom shader, either compiled from source or derived from another shader.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// GLSL file; relative paths are resolved by the loader against the
    /// configuration file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Inline GLSL, used when no path is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, ArgValue>,
    #[serde(default)]
    pub transparency: bool,
}

/// Uniform value as written in TOML: a number or a three element array.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Scalar(f32),
    Vector(Vec<f32>),
}

impl ArgValue {
    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            ArgValue::Vector(values) => <[f32; 3]>::try_from(values.as_slice()).ok(),
            ArgValue::Scalar(_) => None,
        }
    }
}

impl ShadeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ShadeConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn shader(&self, id: &str) -> Option<&ShaderEntry> {
        self.shaders.get(id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.rule_property.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "rule_property may not be empty".into(),
            ));
        }

        for name in &self.builtins {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "builtins may not contain an empty name".into(),
                ));
            }
        }

        for (id, entry) in &self.shaders {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid("shader id may not be empty".into()));
            }

            if id.contains(' ') {
                return Err(ConfigError::Invalid(format!(
                    "shader id '{id}' may not contain spaces"
                )));
            }

            if entry.from.is_none() && entry.path.is_none() && entry.source.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "shader '{id}' needs one of `from`, `path`, or `source`"
                )));
            }

            if entry.path.is_some() && entry.source.is_some() {
                return Err(ConfigError::Invalid(format!(
                    "shader '{id}' sets both `path` and `source`"
                )));
            }

            if entry.from.as_deref() == Some(id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "shader '{id}' cannot derive from itself"
                )));
            }

            for (arg, value) in &entry.args {
                if let ArgValue::Vector(values) = value {
                    if values.len() != 3 {
                        return Err(ConfigError::Invalid(format!(
                            "shader '{id}' arg '{arg}' must have 3 components, found {}",
                            values.len()
                        )));
                    }
                }
            }
        }

        self.definition_order()?;
        Ok(())
    }

    /// Orders shader ids so each configured base precedes the shaders derived
    /// from it. Bases outside this config (builtins) impose no ordering.
    pub fn definition_order(&self) -> Result<Vec<String>, ConfigError> {
        let mut order = Vec::with_capacity(self.shaders.len());
        let mut done = HashSet::new();

        for id in self.shaders.keys() {
            let mut chain = Vec::new();
            let mut cursor = Some(id.as_str());
            while let Some(current) = cursor {
                if done.contains(current) {
                    break;
                }
                if chain.contains(&current) {
                    return Err(ConfigError::Invalid(format!(
                        "shader '{current}' is part of a `from` cycle"
                    )));
                }
                chain.push(current);
                cursor = self
                    .shaders
                    .get(current)
                    .and_then(|entry| entry.from.as_deref())
                    .filter(|base| self.shaders.contains_key(*base));
            }

            for current in chain.into_iter().rev() {
                done.insert(current);
                order.push(current.to_string());
            }
        }

        Ok(order)
    }
}
