use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::TableStatus;

use crate::dynamodb::{Item, ItemRead, Table, UpdateExpression};

/// Result of a `DeleteTable` request.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDeletion {
    /// Status reported for the table once the request is accepted, usually `DELETING`.
    pub status: Option<TableStatus>,
    pub request_id: Option<String>,
}

/// The request/response contract the demo needs from a key-value store.
///
/// Kept as close as possible to the DynamoDB operations so that the real
/// client can be swapped with [`MemoryStore`](crate::dynamodb::MemoryStore)
/// for offline runs and tests.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn list_table_names(&self) -> Result<Vec<String>>;

    /// Issues a create-table request and returns the table's initial status.
    async fn create_table(&self, table: &Table<'_>) -> Result<TableStatus>;

    /// Returns the current table status, or `None` if the table does not exist.
    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>>;

    async fn delete_table(&self, table_name: &str) -> Result<TableDeletion>;

    /// Writes a full item, replacing any item with the same key.
    async fn put_item(&self, table_name: &str, item: Item) -> Result<()>;

    /// Applies `update` to the item at `key` and returns all of its attributes afterwards.
    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        update: &UpdateExpression,
    ) -> Result<Item>;

    async fn get_item(&self, table_name: &str, key: Item, read: &ItemRead)
        -> Result<Option<Item>>;

    async fn delete_item(&self, table_name: &str, key: Item) -> Result<()>;
}
