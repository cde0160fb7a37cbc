//! Parameter injection port.
//!
//! A computation asks for a parameter by key together with a schema that
//! names its type and default. The collaborator resolves the value from
//! wherever configuration lives; the context caches it for the lifetime
//! of the computation instance.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamSchema {
    Boolean { default: bool },
    Number { default: f64 },
    String { default: String },
}

impl ParamSchema {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamSchema::Boolean { .. } => "boolean",
            ParamSchema::Number { .. } => "number",
            ParamSchema::String { .. } => "string",
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamSchema::Boolean { default } => ParamValue::Boolean(*default),
            ParamSchema::Number { default } => ParamValue::Number(*default),
            ParamSchema::String { default } => ParamValue::String(default.clone()),
        }
    }
}

impl fmt::Display for ParamSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (default {})", self.type_name(), self.default_value())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value has the type the schema asks for.
    pub fn matches(&self, schema: &ParamSchema) -> bool {
        matches!(
            (self, schema),
            (ParamValue::Boolean(_), ParamSchema::Boolean { .. })
                | (ParamValue::Number(_), ParamSchema::Number { .. })
                | (ParamValue::String(_), ParamSchema::String { .. })
        )
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Boolean(v) => write!(f, "{v}"),
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::String(v) => write!(f, "{v:?}"),
        }
    }
}

pub trait ParamPort {
    /// Resolve `key`. Implementations return the schema default when the
    /// key is missing or cannot be read as the schema's type.
    fn get_parameter(&self, key: &str, schema: &ParamSchema) -> ParamValue;
}
