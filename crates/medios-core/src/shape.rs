use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Expected structure of an oracle response.
///
/// Shapes only describe strings, arrays and objects with named fields, which
/// covers every structured intent. A shape is used twice: rendered into the
/// oracle's schema dialect so the model is constrained, and again to check the
/// text that comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    String,
    Array(Box<ResponseShape>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub shape: ResponseShape,
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            name: name.into(),
            shape,
            description: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ResponseShape::String)
    }

    pub fn string_list(name: impl Into<String>) -> Self {
        Self::new(name, ResponseShape::string_list())
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected {expected} at {path}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing field at {path}")]
    MissingField { path: String },
}

impl ResponseShape {
    pub fn string_list() -> Self {
        ResponseShape::Array(Box::new(ResponseShape::String))
    }

    pub fn list_of(item: ResponseShape) -> Self {
        ResponseShape::Array(Box::new(item))
    }

    pub fn object(fields: Vec<Field>) -> Self {
        ResponseShape::Object(fields)
    }

    /// Object whose fields are all plain strings.
    pub fn string_object(names: &[&str]) -> Self {
        ResponseShape::Object(names.iter().map(|n| Field::string(*n)).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ResponseShape::Array(_))
    }

    /// Render as the upper-case `type`/`properties`/`items` schema dialect the
    /// generative API accepts for constrained JSON output.
    pub fn to_schema(&self) -> Value {
        match self {
            ResponseShape::String => json!({ "type": "STRING" }),
            ResponseShape::Array(item) => json!({
                "type": "ARRAY",
                "items": item.to_schema(),
            }),
            ResponseShape::Object(fields) => {
                let mut properties = Map::new();
                for field in fields {
                    let mut schema = field.shape.to_schema();
                    if let (Some(desc), Some(obj)) = (&field.description, schema.as_object_mut()) {
                        obj.insert("description".into(), Value::String(desc.clone()));
                    }
                    properties.insert(field.name.clone(), schema);
                }
                json!({
                    "type": "OBJECT",
                    "properties": properties,
                })
            }
        }
    }

    /// Parse raw oracle text and check it against this shape.
    ///
    /// A surrounding Markdown code fence is tolerated. The returned value
    /// contains only declared fields; scalars in string positions are coerced
    /// to their textual form.
    pub fn parse(&self, raw: &str) -> Result<Value, ShapeError> {
        let text = strip_code_fence(raw.trim());
        let value: Value =
            serde_json::from_str(text).map_err(|e| ShapeError::InvalidJson(e.to_string()))?;
        self.validate(&value)
    }

    pub fn validate(&self, value: &Value) -> Result<Value, ShapeError> {
        self.coerce(value, &mut JsonPath::root())
    }

    fn coerce(&self, value: &Value, path: &mut JsonPath) -> Result<Value, ShapeError> {
        match (self, value) {
            (ResponseShape::String, Value::String(s)) => Ok(Value::String(s.clone())),
            (ResponseShape::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (ResponseShape::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (ResponseShape::Array(item), Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, v) in items.iter().enumerate() {
                    path.push_index(idx);
                    out.push(item.coerce(v, path)?);
                    path.pop();
                }
                Ok(Value::Array(out))
            }
            (ResponseShape::Object(fields), Value::Object(map)) => {
                let mut out = Map::new();
                for field in fields {
                    path.push_field(&field.name);
                    let v = map.get(&field.name).ok_or_else(|| ShapeError::MissingField {
                        path: path.to_string(),
                    })?;
                    out.insert(field.name.clone(), field.shape.coerce(v, path)?);
                    path.pop();
                }
                Ok(Value::Object(out))
            }
            (shape, other) => Err(ShapeError::TypeMismatch {
                path: path.to_string(),
                expected: shape.type_name(),
                found: json_type_name(other),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ResponseShape::String => "string",
            ResponseShape::Array(_) => "array",
            ResponseShape::Object(_) => "object",
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.find('\n') {
        Some(nl) => body[nl + 1..].trim(),
        None => body.trim(),
    }
}

enum Segment {
    Field(String),
    Index(usize),
}

struct JsonPath(Vec<Segment>);

impl JsonPath {
    fn root() -> Self {
        JsonPath(Vec::new())
    }

    fn push_field(&mut self, name: &str) {
        self.0.push(Segment::Field(name.to_string()));
    }

    fn push_index(&mut self, idx: usize) {
        self.0.push(Segment::Index(idx));
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.0 {
            match seg {
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis_shape() -> ResponseShape {
        ResponseShape::object(vec![
            Field::string("sentiment"),
            Field::string_list("keyThemes"),
            Field::string("executiveSummary"),
        ])
    }

    #[test]
    fn test_parse_valid_object_drops_extra_fields() {
        let raw = r#"{"sentiment":"Neutral","keyThemes":["inflación"],"executiveSummary":"ok","extra":1}"#;
        let value = analysis_shape().parse(raw).unwrap();
        assert_eq!(
            value,
            json!({"sentiment":"Neutral","keyThemes":["inflación"],"executiveSummary":"ok"})
        );
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let raw = "```json\n[\"a\", \"b\"]\n```";
        let value = ResponseShape::string_list().parse(raw).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_invalid_json() {
        let err = analysis_shape().parse("{not json").unwrap_err();
        assert!(matches!(err, ShapeError::InvalidJson(_)));
    }

    #[test]
    fn test_mismatch_reports_path() {
        let raw = r#"{"sentiment":"Neutral","keyThemes":["a", null],"executiveSummary":"ok"}"#;
        let err = analysis_shape().parse(raw).unwrap_err();
        assert_eq!(
            err,
            ShapeError::TypeMismatch {
                path: "$.keyThemes[1]".into(),
                expected: "string",
                found: "null",
            }
        );
    }

    #[test]
    fn test_missing_field() {
        let raw = r#"{"sentiment":"Neutral","keyThemes":[]}"#;
        let err = analysis_shape().parse(raw).unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingField {
                path: "$.executiveSummary".into()
            }
        );
    }

    #[test]
    fn test_scalars_coerced_to_string() {
        let shape = ResponseShape::string_object(&["value"]);
        assert_eq!(shape.parse(r#"{"value": 12.5}"#).unwrap(), json!({"value": "12.5"}));
        assert_eq!(shape.parse(r#"{"value": true}"#).unwrap(), json!({"value": "true"}));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let shape = ResponseShape::list_of(ResponseShape::string_object(&["title"]));
        assert_eq!(shape.parse("[]").unwrap(), json!([]));
    }

    #[test]
    fn test_schema_rendering() {
        let shape = ResponseShape::object(vec![
            Field::string("sentiment").described("Positivo, Negativo o Neutral."),
            Field::string_list("keyThemes"),
        ]);
        assert_eq!(
            shape.to_schema(),
            json!({
                "type": "OBJECT",
                "properties": {
                    "sentiment": {"type": "STRING", "description": "Positivo, Negativo o Neutral."},
                    "keyThemes": {"type": "ARRAY", "items": {"type": "STRING"}},
                }
            })
        );
    }
}
