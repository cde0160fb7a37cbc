//! INI file parameter adapter. Values live in the `[params]` section.

use crate::domain::error::EngineError;
use crate::ports::param_port::{ParamPort, ParamSchema, ParamValue};
use configparser::ini::Ini;
use std::path::Path;

pub const PARAMS_SECTION: &str = "params";

pub struct FileParamAdapter {
    config: Ini,
}

impl FileParamAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| EngineError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, EngineError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| EngineError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.config.get(PARAMS_SECTION, key)
    }
}

impl ParamPort for FileParamAdapter {
    fn get_parameter(&self, key: &str, schema: &ParamSchema) -> ParamValue {
        let Some(raw) = self.raw(key) else {
            return schema.default_value();
        };
        let parsed = match schema {
            ParamSchema::Boolean { .. } => Self::parse_bool(&raw).map(ParamValue::Boolean),
            ParamSchema::Number { .. } => raw.trim().parse::<f64>().ok().map(ParamValue::Number),
            ParamSchema::String { .. } => Some(ParamValue::String(raw)),
        };
        parsed.unwrap_or_else(|| {
            tracing::warn!(key, expected = schema.type_name(), "unreadable parameter, using default");
            schema.default_value()
        })
    }
}
