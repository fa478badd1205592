//! Knobs shared by the parser, the decoder and the validator.

use serde::Deserialize;

/// Nesting bound applied to parsed and decoded trees, root included.
pub const DEFAULT_MAX_DEPTH: usize = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Deepest accepted tree, counting the root as level 1 and terminals as a level.
    pub max_depth: usize,
    /// What to do with a function that both yields and returns a value.
    pub generator_return: GeneratorReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorReturn {
    #[default]
    Reject,
    Allow,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("max-depth must be at least 1")]
    ZeroDepth,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, generator_return: GeneratorReturn::default() }
    }
}

impl Config {
    /// Reads a configuration object; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(config)
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    pub fn with_generator_return(self, generator_return: GeneratorReturn) -> Self {
        Self { generator_return, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth, 1500);
        assert_eq!(config.generator_return, GeneratorReturn::Reject);
        assert_eq!(Config::from_json("{}").unwrap(), config);
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(r#"{ "generator-return": "allow" }"#).unwrap();
        assert_eq!(config.generator_return, GeneratorReturn::Allow);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);

        let config = Config::from_json(r#"{ "max-depth": 20 }"#).unwrap();
        assert_eq!(config.max_depth, 20);
    }

    #[test]
    fn rejected_configs() {
        assert!(matches!(Config::from_json(r#"{ "max-depth": 0 }"#), Err(ConfigError::ZeroDepth)));
        assert!(matches!(Config::from_json(r#"{ "depth": 3 }"#), Err(ConfigError::Json(_))));
        assert!(matches!(
            Config::from_json(r#"{ "generator-return": "maybe" }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
