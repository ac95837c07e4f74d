use anyhow::{bail, Result};

use crate::dynamodb::{Item, KeyAttribute};

/// Capacity mode of a DynamoDB table.
///
/// - **Provisioned**: you specify the number of reads and writes per second.
/// - **On-Demand**: DynamoDB accommodates workloads as they ramp up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Provisioned {
        read_capacity_units: i64,
        write_capacity_units: i64,
    },
    OnDemand,
}

impl Capacity {
    pub fn provisioned(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Capacity::Provisioned {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

/// DynamoDB table configuration.
///
/// This struct represents a specific DynamoDB table, its key attributes and
/// the capacity it is created with.
///
/// # Table Structure
///
/// - **Table Name**: A unique identifier for the table within your AWS account and region.
/// - **Primary Key**: Consists of a partition key and an optional sort key.
///   - **Partition Key**: Determines the partition where the item is stored.
///   - **Sort Key**: Optional. Orders items sharing the same partition key.
///
/// # Example
///
/// ```
/// use dynamodb::{Capacity, KeyAttribute, Table};
///
/// let table = Table::new(
///     "Customers",
///     KeyAttribute::number("Id"),
///     Some(KeyAttribute::string("CustomerName")),
/// )
/// .with_capacity(Capacity::provisioned(5, 5));
/// ```
#[derive(Debug, Clone)]
pub struct Table<'a> {
    name: &'a str,
    partition_key: KeyAttribute<'a>,
    sort_key: Option<KeyAttribute<'a>>,
    capacity: Capacity,
}

impl<'a> Table<'a> {
    /// Creates a new `Table` instance with on-demand capacity.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the DynamoDB table.
    /// * `partition_key` - The partition key attribute.
    /// * `sort_key` - The sort key attribute, if any.
    pub fn new(
        name: &'a str,
        partition_key: KeyAttribute<'a>,
        sort_key: Option<KeyAttribute<'a>>,
    ) -> Self {
        Self {
            name,
            partition_key,
            sort_key,
            capacity: Capacity::OnDemand,
        }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the partition key of the table.
    #[allow(dead_code)]
    pub fn partition_key(&self) -> KeyAttribute<'a> {
        self.partition_key
    }

    /// Returns the sort key of the table, if any.
    #[allow(dead_code)]
    pub fn sort_key(&self) -> Option<KeyAttribute<'a>> {
        self.sort_key
    }

    /// Returns every key attribute, partition key first.
    pub fn key_attributes(&self) -> impl Iterator<Item = KeyAttribute<'a>> {
        std::iter::once(self.partition_key).chain(self.sort_key)
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Sets the capacity mode and returns the modified `Table`.
    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Checks that `item` carries every key attribute with the schema's type.
    pub fn validate_key(&self, item: &Item) -> Result<()> {
        for key in self.key_attributes() {
            match item.get(key.name()) {
                None => bail!("item is missing key attribute '{}'", key.name()),
                Some(value) if !key.field_type().matches(value) => bail!(
                    "key attribute '{}' must be of type {}",
                    key.name(),
                    key.field_type().descriptor()
                ),
                Some(_) => {}
            }
        }
        Ok(())
    }
}
