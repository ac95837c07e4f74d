//! # DynamoDB Module
//!
//! This module provides a high-level interface for talking to Amazon DynamoDB
//! through the request/response operations the customers demo needs.
//!
//! ## Components
//!
//! - `KeyValueStore`: The store contract the demo driver is written against.
//! - `DynamoDb`: The store backed by the AWS SDK client.
//! - `MemoryStore`: An in-process store with the same semantics, for offline runs.
//! - `Item`: Represents a DynamoDB item with various attribute types.
//! - `Table`, `KeyAttribute`, `Capacity`: Describe a table to create.
//! - `UpdateExpression`, `Projection`: Build update and read expressions.
//!
//! ## Usage
//!
//! Credentials and region are resolved by the AWS default provider chain, e.g.:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//!
//! Optionally, you can also set:
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., DynamoDB Local).

mod client;
mod expression;
mod item;
mod memory;
mod schema;
mod store;
mod table;

pub use client::DynamoDb;
pub use expression::{ItemRead, Projection, UpdateExpression};
pub use item::Item;
pub use memory::MemoryStore;
pub use schema::{FieldType, KeyAttribute};
pub use store::{KeyValueStore, TableDeletion};
pub use table::{Capacity, Table};
