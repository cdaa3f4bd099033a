//! Declarative parameter schemas.
//!
//! A [`ToolSpec`] is the single source of truth for a tool's parameters: it
//! validates and normalizes incoming arguments and renders the JSON Schema
//! advertised to the model.

use seomagic_core::error::ToolError;
use seomagic_core::tool::ToolDefinition;
use serde_json::{Map, Value, json};

use crate::catalog::ToolKind;

/// Inclusive integer range. Values outside are clamped to the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// The kind of value a parameter carries.
#[derive(Debug, Clone)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Array(Box<ParamKind>),
    Object(Vec<(&'static str, ParamSpec)>),
}

impl ParamKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// One parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
    pub allowed: Option<&'static [&'static str]>,
    pub bounds: Option<Bounds>,
    /// Arrays only: reject an empty list.
    pub non_empty: bool,
}

impl ParamSpec {
    fn of(kind: ParamKind, description: &'static str) -> Self {
        Self {
            kind,
            description,
            required: false,
            default: None,
            allowed: None,
            bounds: None,
            non_empty: false,
        }
    }

    pub fn string(description: &'static str) -> Self {
        Self::of(ParamKind::String, description)
    }

    pub fn integer(description: &'static str) -> Self {
        Self::of(ParamKind::Integer, description)
    }

    pub fn boolean(description: &'static str) -> Self {
        Self::of(ParamKind::Boolean, description)
    }

    pub fn strings(description: &'static str) -> Self {
        Self::of(ParamKind::Array(Box::new(ParamKind::String)), description)
    }

    pub fn objects(description: &'static str, fields: Vec<(&'static str, ParamSpec)>) -> Self {
        Self::of(
            ParamKind::Array(Box::new(ParamKind::Object(fields))),
            description,
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn bounded(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = kind_schema(&self.kind);
        if !self.description.is_empty() {
            schema["description"] = json!(self.description);
        }
        if let Some(default) = &self.default {
            schema["default"] = default.clone();
        }
        if let Some(allowed) = self.allowed {
            schema["enum"] = json!(allowed);
        }
        if let Some(bounds) = self.bounds {
            schema["minimum"] = json!(bounds.min);
            schema["maximum"] = json!(bounds.max);
        }
        if self.non_empty {
            schema["minItems"] = json!(1);
        }
        schema
    }
}

fn kind_schema(kind: &ParamKind) -> Value {
    match kind {
        ParamKind::Array(items) => json!({"type": "array", "items": kind_schema(items)}),
        ParamKind::Object(fields) => object_schema(fields),
        other => json!({"type": other.type_name()}),
    }
}

fn object_schema(fields: &[(&'static str, ParamSpec)]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, spec) in fields {
        properties.insert((*name).to_string(), spec.json_schema());
        if spec.required {
            required.push(*name);
        }
    }
    json!({"type": "object", "properties": properties, "required": required})
}

/// A tool declaration: name, description and ordered parameters.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<(&'static str, ParamSpec)>,
}

impl ToolSpec {
    /// Validate raw arguments: fill defaults, coerce, clamp, and reject
    /// missing or ill-typed values.
    pub fn validate(&self, raw: &Value) -> Result<ValidatedArgs, ToolError> {
        let empty = Map::new();
        let map = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ToolError::schema(format!(
                    "{}: arguments must be an object, got {}",
                    self.name,
                    json_type(other)
                )));
            }
        };
        let normalized = validate_fields(&self.params, map, "")
            .map_err(|msg| ToolError::schema(format!("{}: {msg}", self.name)))?;
        Ok(ValidatedArgs(normalized))
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: object_schema(&self.params),
        }
    }
}

fn validate_fields(
    fields: &[(&'static str, ParamSpec)],
    input: &Map<String, Value>,
    prefix: &str,
) -> Result<Map<String, Value>, String> {
    let mut out = Map::new();
    for (name, spec) in fields {
        let path = format!("{prefix}{name}");
        match input.get(*name) {
            None | Some(Value::Null) => {
                if let Some(default) = &spec.default {
                    out.insert((*name).to_string(), default.clone());
                } else if spec.required {
                    return Err(format!("missing required parameter '{path}'"));
                }
            }
            Some(value) => {
                let normalized = normalize(spec, value, &path)?;
                out.insert((*name).to_string(), normalized);
            }
        }
    }
    Ok(out)
}

fn normalize(spec: &ParamSpec, value: &Value, path: &str) -> Result<Value, String> {
    let value = normalize_kind(&spec.kind, value, path)?;

    if let (Some(allowed), Some(s)) = (spec.allowed, value.as_str()) {
        if !allowed.contains(&s) {
            return Err(format!(
                "'{path}' must be one of [{}], got '{s}'",
                allowed.join(", ")
            ));
        }
    }

    if let (Some(bounds), Some(n)) = (spec.bounds, value.as_i64()) {
        return Ok(json!(bounds.clamp(n)));
    }

    if spec.non_empty && value.as_array().is_some_and(|a| a.is_empty()) {
        return Err(format!("'{path}' must not be empty"));
    }

    Ok(value)
}

fn normalize_kind(kind: &ParamKind, value: &Value, path: &str) -> Result<Value, String> {
    let mismatch = || format!("'{path}' must be {}, got {}", article(kind), json_type(value));
    match kind {
        ParamKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
        ParamKind::Integer => match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(|i| json!(i))
                .ok_or_else(mismatch),
            Value::String(s) => s.trim().parse::<i64>().map(|i| json!(i)).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ParamKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if s == "true" => Ok(json!(true)),
            Value::String(s) if s == "false" => Ok(json!(false)),
            _ => Err(mismatch()),
        },
        ParamKind::Array(items) => match value {
            Value::Array(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| normalize_kind(items, v, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(mismatch()),
        },
        ParamKind::Object(fields) => match value {
            Value::Object(map) => {
                validate_fields(fields, map, &format!("{path}.")).map(Value::Object)
            }
            _ => Err(mismatch()),
        },
    }
}

fn article(kind: &ParamKind) -> &'static str {
    match kind {
        ParamKind::String => "a string",
        ParamKind::Integer => "an integer",
        ParamKind::Boolean => "a boolean",
        ParamKind::Array(_) => "an array",
        ParamKind::Object(_) => "an object",
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Arguments that passed validation against a [`ToolSpec`].
///
/// Only [`ToolSpec::validate`] constructs this, so task builders never see
/// unvalidated input.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs(Map<String, Value>);

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A string parameter, treating the empty string as absent.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    /// A boolean parameter; absent means false.
    pub fn flag(&self, name: &str) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn strings(&self, name: &str) -> Vec<String> {
        string_list(self.0.get(name))
    }

    pub fn objects(&self, name: &str) -> &[Value] {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Strings of a JSON array (non-strings skipped).
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
