use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, TableStatus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::dynamodb::{
    FieldType, Item, ItemRead, KeyValueStore, Table, TableDeletion, UpdateExpression,
};

#[derive(Debug)]
struct StoredTable {
    keys: Vec<(String, FieldType)>,
    /// Items by primary key, number keys in canonical form (`1.0` and `1` collide).
    items: HashMap<Vec<String>, Item>,
    polls_until_active: u32,
}

impl StoredTable {
    fn status(&self) -> TableStatus {
        if self.polls_until_active == 0 {
            TableStatus::Active
        } else {
            TableStatus::Creating
        }
    }

    /// Extracts the primary key of `item` in schema order, numbers canonicalised.
    fn primary_key(&self, item: &Item) -> Result<Vec<String>> {
        self.keys
            .iter()
            .map(|(name, field_type)| {
                let value = item.get(name).ok_or_else(|| {
                    anyhow!(
                        "ValidationException: One or more parameter values were invalid: \
                         Missing the key {name} in the item"
                    )
                })?;
                match value {
                    AttributeValue::S(s) if *field_type == FieldType::String => Ok(s.clone()),
                    AttributeValue::N(n) if *field_type == FieldType::Number => {
                        canonical_number(n)
                    }
                    _ => bail!(
                        "ValidationException: One or more parameter values were invalid: \
                         Type mismatch for key {name} expected: {}",
                        field_type.descriptor()
                    ),
                }
            })
            .collect()
    }

    /// Primary key of a request key, which must hold the key attributes and nothing else.
    fn key_of(&self, key: &Item) -> Result<Vec<String>> {
        let primary_key = self.primary_key(key)?;
        if key.len() != self.keys.len() {
            bail!("ValidationException: The provided key element does not match the schema");
        }
        Ok(primary_key)
    }

    fn is_key_attribute(&self, attr_name: &str) -> bool {
        self.keys.iter().any(|(name, _)| name == attr_name)
    }
}

/// In-process [`KeyValueStore`] with DynamoDB's request semantics.
///
/// Tables report `CREATING` for a configurable number of status polls before
/// turning `ACTIVE`, mirroring the asynchronous table creation of the service.
/// Errors carry the service's exception names.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, StoredTable>>,
    activation_polls: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `table_status` calls a new table answers with `CREATING`.
    pub fn with_activation_polls(mut self, polls: u32) -> Self {
        self.activation_polls = polls;
        self
    }

    fn tables(&self) -> Result<MutexGuard<'_, HashMap<String, StoredTable>>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

fn canonical_number(raw: &str) -> Result<String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.to_string()),
        _ => bail!(
            "ValidationException: The parameter cannot be converted to a numeric value: {raw}"
        ),
    }
}

fn not_found() -> anyhow::Error {
    anyhow!("ResourceNotFoundException: Requested resource not found")
}

/// Returns the stored table, refusing writes until it is active.
fn active_table<'t>(
    tables: &'t mut HashMap<String, StoredTable>,
    table_name: &str,
) -> Result<&'t mut StoredTable> {
    let table = tables.get_mut(table_name).ok_or_else(not_found)?;
    if table.status() != TableStatus::Active {
        bail!("ResourceNotFoundException: Requested resource not found: Table: {table_name} is not active");
    }
    Ok(table)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn list_table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_table(&self, table: &Table<'_>) -> Result<TableStatus> {
        let mut tables = self.tables()?;
        if tables.contains_key(table.name()) {
            bail!("ResourceInUseException: Table already exists: {}", table.name());
        }
        let stored = StoredTable {
            keys: table
                .key_attributes()
                .map(|key| (key.name().to_string(), key.field_type()))
                .collect(),
            items: HashMap::new(),
            polls_until_active: self.activation_polls,
        };
        let status = stored.status();
        tables.insert(table.name().to_string(), stored);
        debug!("Memory table '{}' created", table.name());
        Ok(status)
    }

    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        let mut tables = self.tables()?;
        Ok(tables.get_mut(table_name).map(|table| {
            let status = table.status();
            table.polls_until_active = table.polls_until_active.saturating_sub(1);
            status
        }))
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDeletion> {
        self.tables()?.remove(table_name).ok_or_else(not_found)?;
        Ok(TableDeletion {
            status: Some(TableStatus::Deleting),
            request_id: None,
        })
    }

    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        let mut tables = self.tables()?;
        let table = active_table(&mut tables, table_name)?;
        let key = table.primary_key(&item)?;
        table.items.insert(key, item);
        Ok(())
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        update: &UpdateExpression,
    ) -> Result<Item> {
        // Validates the expression the same way the real request would.
        update.render()?;

        let mut tables = self.tables()?;
        let table = active_table(&mut tables, table_name)?;
        let primary_key = table.key_of(&key)?;
        if let Some(name) = update.touched().find(|name| table.is_key_attribute(name)) {
            bail!(
                "ValidationException: One or more parameter values were invalid: \
                 Cannot update attribute {name}. This attribute is part of the key"
            );
        }

        let item = table.items.entry(primary_key).or_insert(key);
        for (name, value) in update.assignments() {
            item.attributes.insert(name.clone(), value.clone());
        }
        for name in update.removals() {
            item.attributes.remove(name);
        }
        Ok(item.clone())
    }

    async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        read: &ItemRead,
    ) -> Result<Option<Item>> {
        let mut tables = self.tables()?;
        let table = active_table(&mut tables, table_name)?;
        let primary_key = table.key_of(&key)?;
        Ok(table.items.get(&primary_key).cloned().map(|item| {
            if read.projection.attributes().is_empty() {
                item
            } else {
                item.retain_only(read.projection.attributes())
            }
        }))
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> Result<()> {
        let mut tables = self.tables()?;
        let table = active_table(&mut tables, table_name)?;
        let primary_key = table.key_of(&key)?;
        table.items.remove(&primary_key);
        Ok(())
    }
}
