use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    operation::RequestId,
    types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput,
        ReturnValue, TableStatus,
    },
    Client,
};
use tracing::{debug, info};

use crate::dynamodb::{
    Capacity, Item, ItemRead, KeyValueStore, Table, TableDeletion, UpdateExpression,
};

/// DynamoDB client wrapper implementing [`KeyValueStore`].
///
/// This struct provides a convenient interface for interacting with Amazon DynamoDB,
/// abstracting away many of the low-level details of the AWS SDK.
///
/// # DynamoDB Concepts
///
/// ## Tables
/// In DynamoDB, a table is a collection of items (rows), and each item consists of attributes (columns).
/// Tables are schema-less apart from their key attributes.
///
/// ## Table creation
/// `CreateTable` returns as soon as the request is accepted, with the table in
/// `CREATING` status. Items can only be written once the table reports `ACTIVE`,
/// so callers poll [`KeyValueStore::table_status`] in between.
///
/// # Error Handling
///
/// Every method returns `Result<T, anyhow::Error>`; SDK errors are converted with `?`
/// and keep the service error as their source.
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: Client,
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl KeyValueStore for DynamoDb {
    // --- Table Operations ---

    async fn list_table_names(&self) -> Result<Vec<String>> {
        let tables = self.client.list_tables().send().await?;
        Ok(tables.table_names().to_vec())
    }

    async fn create_table(&self, table: &Table<'_>) -> Result<TableStatus> {
        let mut attribute_definitions = Vec::new();
        let mut key_schema = Vec::new();

        for (key, key_type) in table
            .key_attributes()
            .zip([KeyType::Hash, KeyType::Range])
        {
            attribute_definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(key.name())
                    .attribute_type(key.field_type().scalar_type())
                    .build()?,
            );
            key_schema.push(
                KeySchemaElement::builder()
                    .attribute_name(key.name())
                    .key_type(key_type)
                    .build()?,
            );
        }

        let mut request = self
            .client
            .create_table()
            .table_name(table.name())
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema));

        request = match table.capacity() {
            Capacity::Provisioned {
                read_capacity_units,
                write_capacity_units,
            } => request.billing_mode(BillingMode::Provisioned).provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(read_capacity_units)
                    .write_capacity_units(write_capacity_units)
                    .build()?,
            ),
            Capacity::OnDemand => request.billing_mode(BillingMode::PayPerRequest),
        };

        let output = request.send().await?;
        info!("Create table request accepted for '{}'", table.name());

        Ok(output
            .table_description()
            .and_then(|description| description.table_status())
            .cloned()
            .unwrap_or(TableStatus::Creating))
    }

    async fn table_status(&self, table_name: &str) -> Result<Option<TableStatus>> {
        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .table()
                .and_then(|description| description.table_status())
                .cloned()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    Ok(None)
                } else {
                    Err(service_error.into())
                }
            }
        }
    }

    async fn delete_table(&self, table_name: &str) -> Result<TableDeletion> {
        let output = self
            .client
            .delete_table()
            .table_name(table_name)
            .send()
            .await?;
        info!("Delete table request accepted for '{table_name}'");

        Ok(TableDeletion {
            status: output
                .table_description()
                .and_then(|description| description.table_status())
                .cloned(),
            request_id: output.request_id().map(str::to_string),
        })
    }

    // --- Item Operations ---

    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item.attributes))
            .send()
            .await?;
        Ok(())
    }

    async fn update_item(
        &self,
        table_name: &str,
        key: Item,
        update: &UpdateExpression,
    ) -> Result<Item> {
        let rendered = update.render()?;
        debug!("Update expression for '{table_name}': {}", rendered.expression);

        // An empty value map is rejected by the service, e.g. for REMOVE-only updates.
        let values = (!rendered.values.is_empty()).then_some(rendered.values);

        let response = self
            .client
            .update_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .update_expression(rendered.expression)
            .set_expression_attribute_names(Some(rendered.names))
            .set_expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .send()
            .await?;

        Ok(response.attributes.map(Item::from).unwrap_or_default())
    }

    async fn get_item(
        &self,
        table_name: &str,
        key: Item,
        read: &ItemRead,
    ) -> Result<Option<Item>> {
        let mut request = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .consistent_read(read.consistent_read);

        if let Some((projection_expression, names)) = read.projection.render() {
            request = request
                .projection_expression(projection_expression)
                .set_expression_attribute_names(Some(names));
        }

        let response = request.send().await?;
        Ok(response.item.map(Item::from))
    }

    async fn delete_item(&self, table_name: &str, key: Item) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(key.attributes))
            .send()
            .await?;
        Ok(())
    }
}
