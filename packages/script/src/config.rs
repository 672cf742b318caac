//! Script configuration and resource limits.

use harvest_value::{Described, Field, Shape};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The only engine name accepted in configs.
pub const ENGINE_LUA: &str = "lua";

pub const DEFAULT_MAX_ALLOCS: u64 = 5000;
pub const DEFAULT_MAX_CONST_OBJECTS: usize = 500;
pub const DEFAULT_MAX_MEMORY: usize = 32 * 1024 * 1024;

/// Per-run resource caps. Fixed at compile time; scripts cannot change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptLimits {
    /// Allocation budget, charged as one unit per ten VM instructions.
    pub max_allocs: u64,
    /// Distinct literals plus function prototypes a script may declare.
    pub max_const_objects: usize,
    /// Hard cap on interpreter heap bytes.
    pub max_memory: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        ScriptLimits {
            max_allocs: DEFAULT_MAX_ALLOCS,
            max_const_objects: DEFAULT_MAX_CONST_OBJECTS,
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }
}

/// A script as written in a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub engine: String,
    pub source: String,
    #[serde(default = "default_max_allocs")]
    pub max_allocs: u64,
    #[serde(default = "default_max_const_objects")]
    pub max_const_objects: usize,
}

fn default_max_allocs() -> u64 {
    DEFAULT_MAX_ALLOCS
}

fn default_max_const_objects() -> usize {
    DEFAULT_MAX_CONST_OBJECTS
}

impl ScriptConfig {
    /// A Lua script with default limits.
    pub fn lua(source: impl Into<String>) -> Self {
        ScriptConfig {
            engine: ENGINE_LUA.to_string(),
            source: source.into(),
            max_allocs: DEFAULT_MAX_ALLOCS,
            max_const_objects: DEFAULT_MAX_CONST_OBJECTS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine != ENGINE_LUA {
            return Err(Error::InvalidConfig(format!(
                "engine must be {ENGINE_LUA:?}, got {:?}",
                self.engine
            )));
        }
        if self.source.trim().is_empty() {
            return Err(Error::InvalidConfig("source is required".to_string()));
        }
        if self.max_allocs <= 100 {
            return Err(Error::InvalidConfig(format!(
                "max_allocs must be greater than 100, got {}",
                self.max_allocs
            )));
        }
        if self.max_const_objects <= 10 {
            return Err(Error::InvalidConfig(format!(
                "max_const_objects must be greater than 10, got {}",
                self.max_const_objects
            )));
        }
        Ok(())
    }

    pub fn limits(&self) -> ScriptLimits {
        ScriptLimits {
            max_allocs: self.max_allocs,
            max_const_objects: self.max_const_objects,
            ..ScriptLimits::default()
        }
    }
}

impl Described for ScriptConfig {
    fn shape() -> Shape {
        Shape::record(
            "ScriptConfig",
            vec![
                Field::of::<String>("engine"),
                Field::of::<String>("source"),
                Field::of::<u64>("max_allocs"),
                Field::of::<usize>("max_const_objects"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_structmap::StructMap;
    use harvest_value::Value;

    #[test]
    fn defaults_fill_missing_limits() {
        let config: ScriptConfig =
            serde_json::from_str(r#"{"engine": "lua", "source": "exit()"}"#).unwrap();
        assert_eq!(config, ScriptConfig::lua("exit()"));
        assert_eq!(config.limits(), ScriptLimits::default());
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let mut wrong_engine = ScriptConfig::lua("exit()");
        wrong_engine.engine = "tengo".to_string();

        let empty = ScriptConfig::lua("   ");

        let mut tiny_allocs = ScriptConfig::lua("exit()");
        tiny_allocs.max_allocs = 100;

        let mut tiny_consts = ScriptConfig::lua("exit()");
        tiny_consts.max_const_objects = 10;

        for config in [wrong_engine, empty, tiny_allocs, tiny_consts] {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))), "{config:?}");
        }
    }

    #[test]
    fn decodes_strictly_from_generic_values() {
        let sm = StructMap::default();
        let raw = Value::Map(
            [
                ("engine".to_string(), Value::from("lua")),
                ("source".to_string(), Value::from("exit()")),
                ("max_allocs".to_string(), Value::from("2000")),
            ]
            .into(),
        );
        let config: ScriptConfig = sm.as_struct(raw.clone()).unwrap();
        assert_eq!(config.max_allocs, 2000);
        assert_eq!(config.max_const_objects, DEFAULT_MAX_CONST_OBJECTS);

        let mut typo = raw;
        typo.insert("max_alocs", 10i64);
        assert!(sm.as_struct::<ScriptConfig>(typo).is_err());
    }
}
