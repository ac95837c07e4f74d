use anyhow::{bail, Result};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

/// A partial update of an item, applied atomically in one `UpdateItem` request.
///
/// Attribute names are always sent through `#u<n>` placeholders so that
/// reserved words never clash with the expression grammar.
///
/// # Example
///
/// ```
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb::UpdateExpression;
///
/// let update = UpdateExpression::new()
///     .set("Title", AttributeValue::S("new value".into()))
///     .set("IsActive", AttributeValue::Bool(true))
///     .remove("DoB");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateExpression {
    assignments: Vec<(String, AttributeValue)>,
    removals: Vec<String>,
}

/// The wire form of an [`UpdateExpression`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedUpdate {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `SET name = value` clause.
    pub fn set(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.assignments.push((name.into(), value));
        self
    }

    /// Adds a `REMOVE name` clause.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.removals.push(name.into());
        self
    }

    pub fn assignments(&self) -> &[(String, AttributeValue)] {
        &self.assignments
    }

    pub fn removals(&self) -> &[String] {
        &self.removals
    }

    /// Every attribute name touched by the update.
    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.assignments
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(self.removals.iter().map(String::as_str))
    }

    /// Renders the update into an expression with its placeholder maps.
    pub fn render(&self) -> Result<RenderedUpdate> {
        if self.assignments.is_empty() && self.removals.is_empty() {
            bail!("update expression has no clauses");
        }

        let mut names = HashMap::new();
        let mut values = HashMap::new();
        let mut clauses = Vec::new();
        let mut index = 0;

        if !self.assignments.is_empty() {
            let mut set_clause = Vec::with_capacity(self.assignments.len());
            for (attr_name, attr_value) in &self.assignments {
                let placeholder = format!("#u{index}");
                let value_placeholder = format!(":u{index}");
                set_clause.push(format!("{placeholder} = {value_placeholder}"));
                names.insert(placeholder, attr_name.clone());
                values.insert(value_placeholder, attr_value.clone());
                index += 1;
            }
            clauses.push(format!("SET {}", set_clause.join(", ")));
        }

        if !self.removals.is_empty() {
            let mut remove_clause = Vec::with_capacity(self.removals.len());
            for attr_name in &self.removals {
                let placeholder = format!("#u{index}");
                remove_clause.push(placeholder.clone());
                names.insert(placeholder, attr_name.clone());
                index += 1;
            }
            clauses.push(format!("REMOVE {}", remove_clause.join(", ")));
        }

        Ok(RenderedUpdate {
            expression: clauses.join(" "),
            names,
            values,
        })
    }
}

/// The attributes a read should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    attributes: Vec<String>,
}

impl Projection {
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Renders the projection as `#p0, #p1, ...` and its names map.
    ///
    /// Returns `None` for an empty projection, which reads every attribute.
    pub fn render(&self) -> Option<(String, HashMap<String, String>)> {
        if self.attributes.is_empty() {
            return None;
        }
        let mut names = HashMap::new();
        let placeholders: Vec<String> = self
            .attributes
            .iter()
            .enumerate()
            .map(|(i, attr_name)| {
                let placeholder = format!("#p{i}");
                names.insert(placeholder.clone(), attr_name.clone());
                placeholder
            })
            .collect();
        Some((placeholders.join(", "), names))
    }
}

/// Options of a `GetItem` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRead {
    pub projection: Projection,
    pub consistent_read: bool,
}
