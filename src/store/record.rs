//! Record, schema and value types
//!
//! Records are ordered sets of named fields with declared primitive types.
//! Exactly one field is the identity key (unique within a store, stable
//! across crawls of the same entity) and by convention one integer field is
//! the status flag, set by the caller before the record reaches the store.

use crate::store::{StoreError, StoreResult};
use std::collections::HashMap;

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
}

/// A typed field value
///
/// `Absent` is the decoded form of an empty cell; it is distinct from any
/// coerced default and renders back to an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Absent,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Renders the value for the record file
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Absent => String::new(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Record status flag, set by the caller before a write
///
/// Encoded as an integer field value: 0 = new, 1 = updated, 2 = terminated.
/// The store itself never interprets the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    New,
    Updated,
    Terminated,
}

impl Status {
    pub fn to_value(self) -> Value {
        Value::Int(match self {
            Status::New => 0,
            Status::Updated => 1,
            Status::Terminated => 2,
        })
    }

    pub fn from_value(value: &Value) -> Option<Status> {
        match value {
            Value::Int(0) => Some(Status::New),
            Value::Int(1) => Some(Status::Updated),
            Value::Int(2) => Some(Status::Terminated),
            _ => None,
        }
    }
}

/// Ordered field schema for a store
///
/// The schema fixes the field order of the record file and the type each
/// cell is decoded to at load time.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
    identity_field: String,
}

impl Schema {
    /// Creates a schema from an ordered field list and the identity field name
    ///
    /// Fails if the identity field does not appear in the field list.
    pub fn new(
        fields: Vec<(String, FieldType)>,
        identity_field: impl Into<String>,
    ) -> StoreResult<Self> {
        let identity_field = identity_field.into();
        if !fields.iter().any(|(name, _)| *name == identity_field) {
            return Err(StoreError::IdentityNotInSchema(identity_field));
        }

        Ok(Self {
            fields,
            identity_field,
        })
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    /// Decodes a raw cell per the declared field type
    ///
    /// An empty cell decodes to [`Value::Absent`]. Integer cells must parse;
    /// float cells are decoded leniently (embedded whitespace stripped, comma
    /// accepted as decimal separator) and fall back to NaN, matching the
    /// number formats seen on the sites this feeds from.
    pub fn parse_value(&self, field: &str, raw: &str) -> StoreResult<Value> {
        let ty = self
            .field_type(field)
            .ok_or_else(|| StoreError::FieldParse {
                field: field.to_string(),
                value: raw.to_string(),
            })?;

        if raw.is_empty() {
            return Ok(Value::Absent);
        }

        match ty {
            FieldType::Str => Ok(Value::Str(raw.to_string())),
            FieldType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| StoreError::FieldParse {
                    field: field.to_string(),
                    value: raw.to_string(),
                }),
            FieldType::Float => Ok(Value::Float(parse_lenient_float(raw))),
        }
    }
}

/// Lenient float decoding: strips whitespace, accepts `,` as the decimal
/// separator, and yields NaN for anything else rather than failing the load.
fn parse_lenient_float(raw: &str) -> f64 {
    let compact: String = raw.split_whitespace().collect();
    let normalized = compact.replace(',', ".");
    normalized.parse::<f64>().unwrap_or(f64::NAN)
}

/// A single record: field name -> value
///
/// Field order is not stored here; the schema supplies it on output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Sets the status flag field
    pub fn set_status(&mut self, field: &str, status: Status) -> &mut Self {
        self.set(field, status.to_value())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    /// Returns the rendered identity-key value for this record
    ///
    /// Keys are compared in rendered form, so an integer key and its string
    /// rendering refer to the same entity.
    pub fn identity(&self, schema: &Schema) -> StoreResult<String> {
        match self.get(schema.identity_field()) {
            Some(value) if !value.is_absent() => Ok(value.render()),
            _ => Err(StoreError::MissingIdentity(
                schema.identity_field().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> Schema {
        Schema::new(
            vec![
                ("id".to_string(), FieldType::Str),
                ("price".to_string(), FieldType::Float),
                ("flag".to_string(), FieldType::Int),
            ],
            "id",
        )
        .unwrap()
    }

    #[test]
    fn test_schema_rejects_unknown_identity() {
        let result = Schema::new(vec![("id".to_string(), FieldType::Str)], "missing");
        assert!(matches!(result, Err(StoreError::IdentityNotInSchema(_))));
    }

    #[test]
    fn test_empty_cell_decodes_to_absent() {
        let schema = test_schema();
        assert_eq!(schema.parse_value("price", "").unwrap(), Value::Absent);
        assert_eq!(schema.parse_value("flag", "").unwrap(), Value::Absent);
    }

    #[test]
    fn test_int_parse() {
        let schema = test_schema();
        assert_eq!(schema.parse_value("flag", "2").unwrap(), Value::Int(2));
        assert!(schema.parse_value("flag", "two").is_err());
    }

    #[test]
    fn test_lenient_float_parse() {
        let schema = test_schema();
        assert_eq!(
            schema.parse_value("price", "12 500,50").unwrap(),
            Value::Float(12500.50)
        );
        match schema.parse_value("price", "n/a").unwrap() {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_identity_rendering() {
        let schema = Schema::new(
            vec![
                ("id".to_string(), FieldType::Int),
                ("flag".to_string(), FieldType::Int),
            ],
            "id",
        )
        .unwrap();

        let mut record = Record::new();
        record.set("id", Value::Int(42));
        assert_eq!(record.identity(&schema).unwrap(), "42");

        let mut missing = Record::new();
        missing.set("flag", Value::Int(0));
        assert!(missing.identity(&schema).is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [Status::New, Status::Updated, Status::Terminated] {
            assert_eq!(Status::from_value(&status.to_value()), Some(status));
        }
        assert_eq!(Status::from_value(&Value::Int(7)), None);
        assert_eq!(Status::from_value(&Value::Str("0".to_string())), None);
    }
}
