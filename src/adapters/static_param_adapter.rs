//! In-memory parameter sources.

use crate::ports::param_port::{ParamPort, ParamSchema, ParamValue};
use std::collections::HashMap;

/// Every parameter resolves to its schema default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParams;

impl ParamPort for DefaultParams {
    fn get_parameter(&self, _key: &str, schema: &ParamSchema) -> ParamValue {
        schema.default_value()
    }
}

/// A fixed key → value map, e.g. parameters supplied by a host process.
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    values: HashMap<String, ParamValue>,
}

impl StaticParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn with_number(self, key: &str, value: f64) -> Self {
        self.with(key, ParamValue::Number(value))
    }

    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with(key, ParamValue::Boolean(value))
    }

    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with(key, ParamValue::String(value.to_string()))
    }
}

impl ParamPort for StaticParams {
    fn get_parameter(&self, key: &str, schema: &ParamSchema) -> ParamValue {
        match self.values.get(key) {
            Some(value) if value.matches(schema) => value.clone(),
            _ => schema.default_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_return_defaults() {
        let schema = ParamSchema::Boolean { default: true };
        assert_eq!(
            DefaultParams.get_parameter("anything", &schema),
            ParamValue::Boolean(true)
        );
    }

    #[test]
    fn static_params_return_matching_values() {
        let params = StaticParams::new()
            .with_number("period", 9.0)
            .with_bool("enabled", false);
        assert_eq!(
            params.get_parameter("period", &ParamSchema::Number { default: 1.0 }),
            ParamValue::Number(9.0)
        );
        assert_eq!(
            params.get_parameter("enabled", &ParamSchema::Boolean { default: true }),
            ParamValue::Boolean(false)
        );
    }

    #[test]
    fn static_params_fall_back_on_type_mismatch() {
        let params = StaticParams::new().with_string("period", "nine");
        assert_eq!(
            params.get_parameter("period", &ParamSchema::Number { default: 1.0 }),
            ParamValue::Number(1.0)
        );
    }
}
