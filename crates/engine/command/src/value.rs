//! Typed interpretation of attribute values returned by the engine
//!
//! Attribute getters answer with a loosely typed JSON value. Each target
//! type implements [`BackendValue`], so the interpretation is picked at
//! compile time by the type parameter of [`parse_backend_value`].

use crate::error::{Error, Result};
use serde_json::Value;

/// A type that can be read from and written to engine attributes
pub trait BackendValue: Sized {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    fn from_backend(value: &Value) -> Option<Self>;

    /// String form accepted by `setAttribute`
    fn to_backend_string(&self) -> String;
}

impl BackendValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_backend(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn to_backend_string(&self) -> String {
        self.to_string()
    }
}

impl BackendValue for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_backend(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_backend_string(&self) -> String {
        self.to_string()
    }
}

impl BackendValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_backend(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(|n| n as f32),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn to_backend_string(&self) -> String {
        self.to_string()
    }
}

impl BackendValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_backend(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn to_backend_string(&self) -> String {
        self.clone()
    }
}

/// RGBA line color as used by the model rendering attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LineColor {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl BackendValue for LineColor {
    const TYPE_NAME: &'static str = "color";

    fn from_backend(value: &Value) -> Option<Self> {
        let value = match value {
            // Colors sometimes arrive as a JSON array inside a string
            Value::String(s) => serde_json::from_str(s).ok()?,
            other => other.clone(),
        };
        let channels = value
            .as_array()?
            .iter()
            .map(|c| c.as_u64().and_then(|c| u8::try_from(c).ok()))
            .collect::<Option<Vec<u8>>>()?;

        match channels.as_slice() {
            [r, g, b] => Some(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Some(Self {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            }),
            _ => None,
        }
    }

    fn to_backend_string(&self) -> String {
        format!("[{}, {}, {}]", self.r, self.g, self.b)
    }
}

/// Interpret a raw response value as `T`.
///
/// Text that is not valid JSON is treated as a plain string.
pub fn parse_backend_value<T: BackendValue>(raw: &str) -> Result<T> {
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    from_backend_value(&value)
}

/// Interpret an already parsed value as `T`
pub fn from_backend_value<T: BackendValue>(value: &Value) -> Result<T> {
    T::from_backend(value).ok_or_else(|| Error::InvalidValue {
        expected: T::TYPE_NAME,
        raw: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert!(parse_backend_value::<bool>("true").unwrap());
        assert!(!parse_backend_value::<bool>("\"0\"").unwrap());
        assert_eq!(parse_backend_value::<i32>("42").unwrap(), 42);
        assert_eq!(parse_backend_value::<i32>("\"-7\"").unwrap(), -7);
        assert!((parse_backend_value::<f32>("0.25").unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_parse_string_without_quotes() {
        assert_eq!(parse_backend_value::<String>("model.obj").unwrap(), "model.obj");
        assert_eq!(parse_backend_value::<String>("\"model.obj\"").unwrap(), "model.obj");
    }

    #[test]
    fn test_parse_line_color() {
        assert_eq!(
            parse_backend_value::<LineColor>("[255, 0, 10]").unwrap(),
            LineColor::rgb(255, 0, 10)
        );
        assert_eq!(
            parse_backend_value::<LineColor>("\"[1,2,3,4]\"").unwrap(),
            LineColor { r: 1, g: 2, b: 3, a: 4 }
        );
        assert_eq!(LineColor::rgb(0, 128, 255).to_backend_string(), "[0, 128, 255]");
    }

    #[test]
    fn test_mismatch_reports_type() {
        match parse_backend_value::<i32>("[1, 2]") {
            Err(Error::InvalidValue { expected, .. }) => assert_eq!(expected, "int"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(parse_backend_value::<LineColor>("[1, 2]").is_err());
        assert!(parse_backend_value::<bool>("maybe").is_err());
    }
}
