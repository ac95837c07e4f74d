//! Tests for the customers demo.
//!
//! These tests cover:
//! - The customer item, key, update and read requests the driver builds
//! - Table existence matching, creation and activation polling
//! - The full demo sequence and its per-step report
//! - Failure handling: failed steps are reported and the run goes on
//!
//! All tests run against `MemoryStore`, except `test_live_dynamodb_run`,
//! which is ignored by default and needs a DynamoDB endpoint.
//!
//! # Live run
//!
//! Set the following environment variables in your `.env` file:
//!
//! ```
//! AWS_ACCESS_KEY_ID=your_access_key
//! AWS_SECRET_ACCESS_KEY=your_secret_key
//! AWS_REGION=your_preferred_region
//! ```
//!
//! For DynamoDB Local, use dummy credentials and set:
//!
//! ```
//! AWS_ENDPOINT_URL=http://localhost:8000
//! ```
//!
//! Then run:
//!
//! ```
//! cargo test -- --ignored
//! ```

use crate::config::{Backend, DemoConfig};
use crate::console;
use crate::driver::{
    customer_key, customer_name, customer_read, customer_update, Customer, Driver, NameMatch, Outcome, Step, TableCreation,
    DELETED_ITEM, ITEM_COUNT, NEW_TITLE, UPDATED_ITEM,
};
use crate::dynamodb::{
    DynamoDb, FieldType, Item, KeyAttribute, KeyValueStore, MemoryStore, Table, TableDeletion,
};
use anyhow::{anyhow, Result};
use aws_sdk_dynamodb::types::{AttributeValue, TableStatus};
use std::time::Duration;
use tracing::{info, instrument};

const TEST_TABLE_NAME: &str = "Customers";

fn test_config() -> DemoConfig {
    DemoConfig {
        table_name: TEST_TABLE_NAME.to_string(),
        backend: Backend::Memory,
        poll_interval: Duration::from_millis(1),
        max_polls: 5,
        pause_on_exit: false,
        ..DemoConfig::default()
    }
}

#[instrument(skip(store))]
async fn setup_active_table(store: &MemoryStore, config: &DemoConfig) -> Result<()> {
    let driver = Driver::new(store, config);
    assert_eq!(driver.ensure_table_exists().await?, TableCreation::Created);
    driver.wait_until_active().await?;
    info!("Table is active");
    Ok(())
}

#[test]
fn test_customer_items() -> Result<()> {
    for n in 0..ITEM_COUNT {
        let item = Customer::new(n).to_item()?;

        assert_eq!(item.get("Id"), Some(&AttributeValue::N(n.to_string())));
        assert_eq!(
            item.get_string("CustomerName"),
            Some(&format!("CustomerName #{n}"))
        );
        let mut address = item.get_string_set("Address").cloned().unwrap_or_default();
        address.sort();
        assert_eq!(address, vec!["7 Eleven street", "Perth, WA 6000"]);
        assert_eq!(item.get_number("DoB"), Some(1984.0));
        assert_eq!(item.get_bool("IsActive"), Some(false));
        assert_eq!(item.len(), 5);
    }
    Ok(())
}

#[test]
fn test_customer_key_matches_schema() {
    let config = test_config();
    let store = MemoryStore::new();
    let driver = Driver::new(&store, &config);
    let table = driver.customers_table();

    let key = customer_key(2);
    assert!(table.validate_key(&key).is_ok());
    assert_eq!(key.get_number("Id"), Some(2.0));
    assert_eq!(key.get_string("CustomerName"), Some(&"CustomerName #2".to_string()));

    let mistyped = Item::new()
        .set_string("Id", "2")
        .set_string("CustomerName", "CustomerName #2");
    assert!(table.validate_key(&mistyped).is_err());
    assert!(table.validate_key(&Item::new().set_number("Id", 2)).is_err());
}

#[test]
fn test_table_operations() {
    let table = Table::new(
        "test_table",
        KeyAttribute::number("partition_key"),
        Some(KeyAttribute::string("sort_key")),
    );

    assert_eq!(table.name(), "test_table");
    assert_eq!(table.partition_key().name(), "partition_key");
    assert_eq!(table.partition_key().field_type(), FieldType::Number);
    assert_eq!(table.sort_key().map(|key| key.name()), Some("sort_key"));
    assert_eq!(table.key_attributes().count(), 2);
}

#[test]
fn test_name_matching() {
    assert!(NameMatch::Exact.matches("Customers", "Customers"));
    assert!(!NameMatch::Exact.matches("CustomersArchive", "Customers"));
    assert!(NameMatch::Substring.matches("CustomersArchive", "Customers"));
    assert!(NameMatch::Substring.matches("OldCustomers", "Customers"));
    assert!(!NameMatch::Substring.matches("Orders", "Customers"));
}

#[test]
fn test_render_item() {
    let item = Item::new()
        .set_number("Id", 1)
        .set_string_set("Address", ["7 Eleven street", "Perth, WA 6000"])
        .set_bool("IsActive", true);

    let rendered = console::render_item(&item);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], "Address SS=[7 Eleven street,Perth, WA 6000]");
    assert_eq!(lines[2], "Id N=[1]");
    assert_eq!(lines[3], "IsActive BOOL=[true]");
}

#[test]
fn test_render_failure() {
    let error = anyhow!("ResourceNotFoundException: Requested resource not found")
        .context("failed to put customer 2");
    let rendered = console::render_failure("PutItem failed", &error);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "PutItem failed");
    assert_eq!(lines[1], lines[4]);
    assert_eq!(lines[2], "failed to put customer 2");
    assert_eq!(
        lines[3],
        "ResourceNotFoundException: Requested resource not found"
    );

    // A bare error is its own root cause and is printed once.
    let error = anyhow!("ValidationException: bad key");
    let rendered = console::render_failure("GetItem failed", &error);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[2], "ValidationException: bad key");
    assert_eq!(lines[1], lines[3]);
}

#[test]
fn test_render_deletion() {
    let unknown = TableDeletion {
        status: None,
        request_id: None,
    };
    assert_eq!(
        console::render_deletion(&unknown),
        "Status: UNKNOWN RequestId: -"
    );

    let deleting = TableDeletion {
        status: Some(TableStatus::Deleting),
        request_id: Some("req-1".to_string()),
    };
    assert_eq!(
        console::render_deletion(&deleting),
        "Status: DELETING RequestId: req-1"
    );
}

#[tokio::test]
async fn test_substring_match_treats_similar_name_as_existing() -> Result<()> {
    let store = MemoryStore::new();
    store
        .create_table(&Table::new(
            "CustomersArchive",
            KeyAttribute::number("Id"),
            None,
        ))
        .await?;

    let legacy = DemoConfig {
        name_match: NameMatch::Substring,
        ..test_config()
    };
    let driver = Driver::new(&store, &legacy);
    assert!(driver.table_exists().await?);
    assert_eq!(
        driver.ensure_table_exists().await?,
        TableCreation::AlreadyExists
    );

    let exact = test_config();
    let driver = Driver::new(&store, &exact);
    assert!(!driver.table_exists().await?);
    assert_eq!(driver.ensure_table_exists().await?, TableCreation::Created);
    assert_eq!(
        driver.ensure_table_exists().await?,
        TableCreation::AlreadyExists
    );
    Ok(())
}

#[tokio::test]
async fn test_wait_until_active() -> Result<()> {
    let store = MemoryStore::new().with_activation_polls(3);
    let config = test_config();
    let driver = Driver::new(&store, &config);

    driver.ensure_table_exists().await?;
    assert!(driver.put_customer(0).await.is_err());

    driver.wait_until_active().await?;
    assert_eq!(
        store.table_status(TEST_TABLE_NAME).await?,
        Some(TableStatus::Active)
    );
    driver.put_customer(0).await?;
    Ok(())
}

#[tokio::test]
async fn test_wait_until_active_gives_up() -> Result<()> {
    let store = MemoryStore::new().with_activation_polls(10);
    let config = DemoConfig {
        max_polls: 2,
        ..test_config()
    };
    let driver = Driver::new(&store, &config);

    driver.ensure_table_exists().await?;
    let err = driver.wait_until_active().await.unwrap_err();
    assert!(err.to_string().contains("not active after 2 polls"));
    Ok(())
}

#[tokio::test]
async fn test_wait_until_active_missing_table() {
    let store = MemoryStore::new();
    let config = test_config();
    let driver = Driver::new(&store, &config);

    let err = driver.wait_until_active().await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_update_then_get() -> Result<()> {
    let store = MemoryStore::new();
    let config = test_config();
    setup_active_table(&store, &config).await?;
    let driver = Driver::new(&store, &config);

    driver.put_customer(UPDATED_ITEM).await?;

    info!("Testing update echo");
    let updated = driver.update_customer(UPDATED_ITEM).await?;
    assert_eq!(updated.get_string("Title"), Some(&NEW_TITLE.to_string()));
    assert_eq!(updated.get_bool("IsActive"), Some(true));
    assert!(!updated.contains("DoB"));
    assert!(updated.contains("Address"));

    info!("Testing update idempotence");
    let again = driver.update_customer(UPDATED_ITEM).await?;
    assert_eq!(again, updated);

    info!("Testing projected read");
    let fetched = driver
        .get_customer(UPDATED_ITEM)
        .await?
        .expect("updated customer should exist");
    assert!(!fetched.contains("DoB"));
    assert!(!fetched.contains("Title"));
    assert!(!fetched.contains("IsActive"));
    assert_eq!(fetched.get_number("Id"), Some(UPDATED_ITEM as f64));
    assert_eq!(fetched.get_string_set("Address").map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_update_key_attribute_is_rejected() -> Result<()> {
    let store = MemoryStore::new();
    let config = test_config();
    setup_active_table(&store, &config).await?;

    let update = customer_update().set("CustomerName", AttributeValue::S("renamed".to_string()));
    let err = store
        .update_item(TEST_TABLE_NAME, customer_key(1), &update)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("part of the key"));
    Ok(())
}

#[tokio::test]
async fn test_key_with_extra_attributes_is_rejected() -> Result<()> {
    let store = MemoryStore::new();
    let config = test_config();
    setup_active_table(&store, &config).await?;
    let driver = Driver::new(&store, &config);
    driver.put_customer(2).await?;

    let full_item = Customer::new(2).to_item()?;
    let update_err = store
        .update_item(TEST_TABLE_NAME, full_item.clone(), &customer_update())
        .await
        .unwrap_err();
    let get_err = store
        .get_item(TEST_TABLE_NAME, full_item.clone(), &customer_read())
        .await
        .unwrap_err();
    let delete_err = store
        .delete_item(TEST_TABLE_NAME, full_item)
        .await
        .unwrap_err();
    for err in [update_err, get_err, delete_err] {
        assert!(err.to_string().contains("does not match the schema"));
    }

    let stored = driver.get_customer(2).await?.expect("customer 2 is still stored");
    assert!(stored.contains("DoB"));
    Ok(())
}

#[tokio::test]
async fn test_number_keys_compare_by_value() -> Result<()> {
    let store = MemoryStore::new();
    let config = test_config();
    setup_active_table(&store, &config).await?;
    let driver = Driver::new(&store, &config);
    driver.put_customer(1).await?;

    let key = Item::new()
        .set_number("Id", "1.0")
        .set_string("CustomerName", customer_name(1));
    let fetched = store
        .get_item(TEST_TABLE_NAME, key.clone(), &customer_read())
        .await?;
    assert!(fetched.is_some());

    store.delete_item(TEST_TABLE_NAME, key).await?;
    assert!(driver.get_customer(1).await?.is_none());

    let bad = Item::new()
        .set_number("Id", "one")
        .set_string("CustomerName", customer_name(1));
    let err = store.put_item(TEST_TABLE_NAME, bad).await.unwrap_err();
    assert!(err.to_string().contains("numeric value"));
    Ok(())
}

#[tokio::test]
async fn test_delete_and_get_missing_item() -> Result<()> {
    let store = MemoryStore::new();
    let config = test_config();
    setup_active_table(&store, &config).await?;
    let driver = Driver::new(&store, &config);

    driver.put_customer(DELETED_ITEM).await?;
    assert!(driver.get_customer(DELETED_ITEM).await?.is_some());

    driver.delete_customer(DELETED_ITEM).await?;
    assert!(driver.get_customer(DELETED_ITEM).await?.is_none());

    // Deleting an absent item is not an error.
    driver.delete_customer(DELETED_ITEM).await?;
    Ok(())
}

#[tokio::test]
async fn test_item_operations_on_missing_table_fail() {
    let store = MemoryStore::new();
    let config = test_config();
    let driver = Driver::new(&store, &config);

    let err = driver.put_customer(0).await.unwrap_err();
    assert!(err.to_string().contains("ResourceNotFoundException"));
    assert!(driver.delete_customer(0).await.is_err());
    assert!(driver.delete_table().await.is_err());
}

#[tokio::test]
#[instrument]
async fn test_full_run() -> Result<()> {
    info!("Starting test_full_run");
    let store = MemoryStore::new().with_activation_polls(2);
    let config = test_config();
    let driver = Driver::new(&store, &config);

    let report = driver.run().await;

    assert!(report.is_success(), "unexpected failures: {report:?}");
    assert!(!report.halted());
    let steps: Vec<Step> = report.steps().iter().map(|r| r.step).collect();
    assert_eq!(
        steps,
        vec![
            Step::EnsureTable,
            Step::WaitUntilActive,
            Step::PutItem(0),
            Step::PutItem(1),
            Step::PutItem(2),
            Step::PutItem(3),
            Step::PutItem(4),
            Step::UpdateItem(UPDATED_ITEM),
            Step::GetItem(UPDATED_ITEM),
            Step::DeleteItem(DELETED_ITEM),
            Step::DeleteTable,
        ]
    );

    info!("Checking the table is gone");
    assert!(!driver.table_exists().await?);
    assert_eq!(store.table_status(TEST_TABLE_NAME).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_run_continues_after_failures() -> Result<()> {
    // The legacy match mistakes this table for the customers table, so no table gets created.
    let store = MemoryStore::new();
    store
        .create_table(&Table::new(
            "CustomersArchive",
            KeyAttribute::number("Id"),
            None,
        ))
        .await?;
    let config = DemoConfig {
        name_match: NameMatch::Substring,
        wait_for_active: false,
        ..test_config()
    };

    let report = Driver::new(&store, &config).run().await;

    assert!(!report.halted());
    assert_eq!(report.steps().len(), 10);
    assert_eq!(report.outcome(Step::EnsureTable), Some(&Outcome::Succeeded));
    for n in 0..ITEM_COUNT {
        assert!(matches!(
            report.outcome(Step::PutItem(n)),
            Some(Outcome::Failed(_))
        ));
    }
    assert!(matches!(
        report.outcome(Step::DeleteItem(DELETED_ITEM)),
        Some(Outcome::Failed(_))
    ));
    assert!(matches!(
        report.outcome(Step::DeleteTable),
        Some(Outcome::Failed(_))
    ));
    assert_eq!(store.list_table_names().await?, vec!["CustomersArchive"]);
    Ok(())
}

#[tokio::test]
async fn test_strict_run_halts_at_first_failure() -> Result<()> {
    let store = MemoryStore::new();
    store
        .create_table(&Table::new(
            "CustomersArchive",
            KeyAttribute::number("Id"),
            None,
        ))
        .await?;
    let config = DemoConfig {
        name_match: NameMatch::Substring,
        wait_for_active: false,
        strict: true,
        ..test_config()
    };

    let report = Driver::new(&store, &config).run().await;

    assert!(report.halted());
    assert_eq!(report.steps().len(), 2);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.failures().next().map(|r| r.step), Some(Step::PutItem(0)));
    Ok(())
}

#[tokio::test]
#[ignore = "requires a DynamoDB endpoint and credentials"]
async fn test_live_dynamodb_run() -> Result<()> {
    dotenv::dotenv().ok();
    let sdk_config = aws_config::load_from_env().await;
    let ddb = DynamoDb::new(&sdk_config);
    let config = DemoConfig {
        table_name: "CustomersDemoTest".to_string(),
        backend: Backend::DynamoDb,
        poll_interval: Duration::from_secs(1),
        max_polls: 15,
        ..test_config()
    };
    let driver = Driver::new(&ddb, &config);

    let report = driver.run().await;
    assert!(report.is_success(), "unexpected failures: {report:?}");
    Ok(())
}
