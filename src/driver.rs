//! The customers demo: one table, five customers, and a fixed sequence of
//! requests against a [`KeyValueStore`].

use anyhow::{anyhow, bail, Context, Result};
use aws_sdk_dynamodb::types::{AttributeValue, TableStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::config::DemoConfig;
use crate::console;
use crate::dynamodb::{
    Capacity, Item, ItemRead, KeyAttribute, KeyValueStore, Projection, Table, TableDeletion,
    UpdateExpression,
};
use crate::utils::poll_with_backoff;

pub const PARTITION_KEY: &str = "Id";
pub const SORT_KEY: &str = "CustomerName";
pub const READ_CAPACITY_UNITS: i64 = 5;
pub const WRITE_CAPACITY_UNITS: i64 = 5;

/// Customers `0..ITEM_COUNT` are written.
pub const ITEM_COUNT: u32 = 5;
pub const UPDATED_ITEM: u32 = 1;
pub const DELETED_ITEM: u32 = 3;

pub const ADDRESS: [&str; 2] = ["7 Eleven street", "Perth, WA 6000"];
pub const DATE_OF_BIRTH: i32 = 1984;
pub const NEW_TITLE: &str = "new value";
pub const READ_PROJECTION: [&str; 4] = ["Id", "CustomerName", "Address", "DoB"];

/// How an existing table name is matched against the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    #[default]
    Exact,
    /// Legacy behavior: any listed name containing the wanted name counts.
    Substring,
}

impl NameMatch {
    pub fn matches(self, listed: &str, wanted: &str) -> bool {
        match self {
            NameMatch::Exact => listed == wanted,
            NameMatch::Substring => listed.contains(wanted),
        }
    }
}

impl FromStr for NameMatch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(NameMatch::Exact),
            "substring" | "legacy" => Ok(NameMatch::Substring),
            other => Err(anyhow!(
                "unknown name match '{other}' (expected exact or substring)"
            )),
        }
    }
}

/// A customer record as written by the demo.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub id: u32,
    pub customer_name: String,
    #[serde(with = "serde_dynamo::string_set")]
    pub address: Vec<String>,
    #[serde(rename = "DoB")]
    pub date_of_birth: i32,
    pub is_active: bool,
}

impl Customer {
    pub fn new(n: u32) -> Self {
        Self {
            id: n,
            customer_name: customer_name(n),
            address: ADDRESS.iter().map(|line| line.to_string()).collect(),
            date_of_birth: DATE_OF_BIRTH,
            is_active: false,
        }
    }

    pub fn to_item(&self) -> Result<Item> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(self)
            .with_context(|| format!("failed to serialize customer #{}", self.id))?;
        Ok(Item::from(attributes))
    }
}

pub fn customer_name(n: u32) -> String {
    format!("CustomerName #{n}")
}

/// The composite key of customer `n`.
pub fn customer_key(n: u32) -> Item {
    Item::new()
        .set_number(PARTITION_KEY, n)
        .set_string(SORT_KEY, customer_name(n))
}

/// Sets a title, activates the customer and drops the date of birth, in one request.
pub fn customer_update() -> UpdateExpression {
    UpdateExpression::new()
        .set("Title", AttributeValue::S(NEW_TITLE.to_string()))
        .set("IsActive", AttributeValue::Bool(true))
        .remove("DoB")
}

pub fn customer_read() -> ItemRead {
    ItemRead {
        projection: Projection::new(READ_PROJECTION),
        consistent_read: true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCreation {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EnsureTable,
    WaitUntilActive,
    PutItem(u32),
    UpdateItem(u32),
    GetItem(u32),
    DeleteItem(u32),
    DeleteTable,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::EnsureTable => write!(f, "create table"),
            Step::WaitUntilActive => write!(f, "wait for table"),
            Step::PutItem(n) => write!(f, "put item #{n}"),
            Step::UpdateItem(n) => write!(f, "update item #{n}"),
            Step::GetItem(n) => write!(f, "get item #{n}"),
            Step::DeleteItem(n) => write!(f, "delete item #{n}"),
            Step::DeleteTable => write!(f, "delete table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: Outcome,
}

/// Per-step results of a run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    steps: Vec<StepReport>,
    halted: bool,
}

struct Halted;

impl RunReport {
    pub fn steps(&self) -> &[StepReport] {
        &self.steps
    }

    #[allow(dead_code)]
    pub fn outcome(&self, step: Step) -> Option<&Outcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|report| matches!(report.outcome, Outcome::Failed(_)))
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Whether the run stopped early at a failed step.
    pub fn halted(&self) -> bool {
        self.halted
    }

    fn record<T>(&mut self, step: Step, result: &Result<T>, strict: bool) -> Result<(), Halted> {
        let outcome = match result {
            Ok(_) => Outcome::Succeeded,
            Err(e) => Outcome::Failed(format!("{e:#}")),
        };
        let failed = outcome != Outcome::Succeeded;
        self.steps.push(StepReport { step, outcome });
        if failed && strict {
            warn!("Halting after failed step: {step}");
            self.halted = true;
            return Err(Halted);
        }
        Ok(())
    }
}

/// Runs the demo sequence against a store handed in by the caller.
pub struct Driver<'a> {
    store: &'a dyn KeyValueStore,
    config: &'a DemoConfig,
}

impl<'a> Driver<'a> {
    pub fn new(store: &'a dyn KeyValueStore, config: &'a DemoConfig) -> Self {
        Self { store, config }
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn customers_table(&self) -> Table<'_> {
        Table::new(
            self.table_name(),
            KeyAttribute::number(PARTITION_KEY),
            Some(KeyAttribute::string(SORT_KEY)),
        )
        .with_capacity(Capacity::provisioned(
            READ_CAPACITY_UNITS,
            WRITE_CAPACITY_UNITS,
        ))
    }

    /// Checks the listed table names using the configured [`NameMatch`].
    pub async fn table_exists(&self) -> Result<bool> {
        let wanted = self.table_name();
        let names = self.store.list_table_names().await?;
        Ok(names
            .iter()
            .any(|listed| self.config.name_match.matches(listed, wanted)))
    }

    #[instrument(skip(self), fields(table = %self.table_name()))]
    pub async fn ensure_table_exists(&self) -> Result<TableCreation> {
        if self.table_exists().await? {
            info!("Table already exists");
            return Ok(TableCreation::AlreadyExists);
        }
        let status = self.store.create_table(&self.customers_table()).await?;
        info!("Table created with status {}", status.as_str());
        Ok(TableCreation::Created)
    }

    /// Polls the table status until it reports `ACTIVE`.
    #[instrument(skip(self), fields(table = %self.table_name()))]
    pub async fn wait_until_active(&self) -> Result<()> {
        let table_name = self.table_name();
        let active = poll_with_backoff(
            || self.check_active(),
            self.config.poll_interval,
            self.config.max_polls,
        )
        .await?;

        active.ok_or_else(|| {
            anyhow!(
                "table '{table_name}' is not active after {} polls",
                self.config.max_polls
            )
        })
    }

    async fn check_active(&self) -> Result<Option<()>> {
        let table_name = self.table_name();
        match self.store.table_status(table_name).await? {
            None => bail!("table '{table_name}' does not exist"),
            Some(TableStatus::Active) => Ok(Some(())),
            Some(status) => {
                debug!("Table status is {}", status.as_str());
                Ok(None)
            }
        }
    }

    pub async fn put_customer(&self, n: u32) -> Result<()> {
        let item = Customer::new(n).to_item()?;
        self.customers_table().validate_key(&item)?;
        self.store.put_item(self.table_name(), item).await
    }

    /// Applies [`customer_update`] and returns the item's attributes afterwards.
    pub async fn update_customer(&self, n: u32) -> Result<Item> {
        self.store
            .update_item(self.table_name(), customer_key(n), &customer_update())
            .await
    }

    pub async fn get_customer(&self, n: u32) -> Result<Option<Item>> {
        self.store
            .get_item(self.table_name(), customer_key(n), &customer_read())
            .await
    }

    pub async fn delete_customer(&self, n: u32) -> Result<()> {
        self.store.delete_item(self.table_name(), customer_key(n)).await
    }

    pub async fn delete_table(&self) -> Result<TableDeletion> {
        self.store.delete_table(self.table_name()).await
    }

    /// Runs every step in order, narrating each one.
    ///
    /// Failed steps are reported and the run goes on, unless the config is strict.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        // A strict halt has already been recorded in the report.
        let _ = self.run_steps(&mut report).await;
        report
    }

    async fn run_steps(&self, report: &mut RunReport) -> Result<(), Halted> {
        let strict = self.config.strict;
        let table_name = self.table_name();

        let creation = self.ensure_table_exists().await;
        match &creation {
            Ok(TableCreation::Created) => println!("Table created"),
            Ok(TableCreation::AlreadyExists) => {
                println!("Cannot create the table because the table exists")
            }
            Err(e) => console::print_failure("Table cannot be created", e),
        }
        report.record(Step::EnsureTable, &creation, strict)?;

        if self.config.wait_for_active {
            println!("-- Waiting for the table to become active --");
            let waited = self.wait_until_active().await;
            match &waited {
                Ok(()) => println!("Table {table_name} is active"),
                Err(e) => console::print_failure("Table did not become active", e),
            }
            report.record(Step::WaitUntilActive, &waited, strict)?;
        }

        for n in 0..ITEM_COUNT {
            let put = self.put_customer(n).await;
            match &put {
                Ok(()) => println!("Item #{n} was added to table {table_name}"),
                Err(e) => console::print_failure(
                    &format!("Error adding item #{n} to table {table_name}"),
                    e,
                ),
            }
            report.record(Step::PutItem(n), &put, strict)?;
        }

        let updated = self.update_customer(UPDATED_ITEM).await;
        match &updated {
            Ok(item) => {
                println!("Printing item after multiple attribute update ............");
                console::print_item(item);
            }
            Err(e) => console::print_failure(
                &format!("Error updating item #{UPDATED_ITEM} in table {table_name}"),
                e,
            ),
        }
        report.record(Step::UpdateItem(UPDATED_ITEM), &updated, strict)?;
        console::print_separator();

        let fetched = self.get_customer(UPDATED_ITEM).await;
        match &fetched {
            Ok(Some(item)) => {
                println!("Item #{UPDATED_ITEM} was retrieved");
                console::print_item(item);
            }
            Ok(None) => println!("Item #{UPDATED_ITEM} was not found in table {table_name}"),
            Err(e) => console::print_failure(
                &format!("Error retrieving item #{UPDATED_ITEM} from table {table_name}"),
                e,
            ),
        }
        report.record(Step::GetItem(UPDATED_ITEM), &fetched, strict)?;
        console::print_separator();

        let deleted = self.delete_customer(DELETED_ITEM).await;
        match &deleted {
            Ok(()) => println!("Item #{DELETED_ITEM} was deleted from table {table_name}"),
            Err(e) => console::print_failure(
                &format!("Error deleting item #{DELETED_ITEM} from table {table_name}"),
                e,
            ),
        }
        report.record(Step::DeleteItem(DELETED_ITEM), &deleted, strict)?;
        console::print_separator();

        let dropped = self.delete_table().await;
        match &dropped {
            Ok(deletion) => {
                println!("{table_name} table deleted");
                console::print_deletion(deletion);
            }
            Err(e) => console::print_failure(
                &format!("Error deleting table {table_name}"),
                e,
            ),
        }
        report.record(Step::DeleteTable, &dropped, strict)?;
        console::print_separator();

        Ok(())
    }
}
