use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Represents a DynamoDB item with various attribute types.
///
/// In DynamoDB, an item is a collection of attributes, each with a name and a value.
/// Items are similar to rows or records in other database systems.
///
/// # Primary Key
///
/// - Every item in a table is uniquely identified by its primary key.
/// - The primary key can be simple (partition key only) or composite (partition key and sort key).
/// - A key used for get/update/delete is itself an `Item` holding only the key attributes.
///
/// # Example
///
/// ```
/// use dynamodb::Item;
///
/// let item = Item::new()
///     .set_number("Id", 1)
///     .set_string("CustomerName", "CustomerName #1")
///     .set_string_set("Address", ["7 Eleven street", "Perth, WA 6000"])
///     .set_bool("IsActive", false);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute.
    ///
    /// Numbers travel as strings on the wire, so any displayable number is accepted.
    pub fn set_number(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.to_string()));
        self
    }

    /// Sets a string-set attribute.
    pub fn set_string_set<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.insert(
            key.into(),
            AttributeValue::Ss(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Sets a boolean attribute.
    pub fn set_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.attributes.insert(key.into(), AttributeValue::Bool(value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    #[allow(dead_code)]
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    #[allow(dead_code)]
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// Gets the value of a string-set attribute.
    #[allow(dead_code)]
    pub fn get_string_set(&self, key: &str) -> Option<&Vec<String>> {
        self.attributes.get(key).and_then(|av| av.as_ss().ok())
    }

    /// Gets the value of a boolean attribute.
    #[allow(dead_code)]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_bool().ok())
            .copied()
    }

    /// Keeps only the attributes whose names are listed in `names`.
    pub fn retain_only(mut self, names: &[String]) -> Self {
        self.attributes.retain(|name, _| names.contains(name));
        self
    }

    /// Returns the attributes ordered by name.
    pub fn sorted(&self) -> BTreeMap<&str, &AttributeValue> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect()
    }
}

impl From<HashMap<String, AttributeValue>> for Item {
    fn from(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }
}
