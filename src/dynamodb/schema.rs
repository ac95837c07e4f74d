use aws_sdk_dynamodb::types::{AttributeValue, ScalarAttributeType};

/// Represents the type of a key attribute in a DynamoDB table schema.
///
/// DynamoDB only needs the types of key attributes up front; every other
/// attribute is schemaless. Key attributes must be scalar, so this enum
/// covers the scalar types used by the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Represents a string field (`S`).
    String,
    /// Represents a number field (`N`).
    Number,
}

impl FieldType {
    /// Returns the scalar type sent in the table's attribute definitions.
    pub fn scalar_type(self) -> ScalarAttributeType {
        match self {
            FieldType::String => ScalarAttributeType::S,
            FieldType::Number => ScalarAttributeType::N,
        }
    }

    /// Returns the wire descriptor of the type (`S` or `N`).
    pub fn descriptor(self) -> &'static str {
        match self {
            FieldType::String => "S",
            FieldType::Number => "N",
        }
    }

    /// Checks whether `value` carries this type.
    pub fn matches(self, value: &AttributeValue) -> bool {
        match self {
            FieldType::String => value.is_s(),
            FieldType::Number => value.is_n(),
        }
    }
}

/// A key attribute of a table: its name and scalar type.
///
/// The key schema of a table is fixed permanently when the table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAttribute<'a> {
    name: &'a str,
    field_type: FieldType,
}

impl<'a> KeyAttribute<'a> {
    pub fn new(name: &'a str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    /// Creates a string-typed key attribute.
    pub fn string(name: &'a str) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Creates a number-typed key attribute.
    pub fn number(name: &'a str) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}
