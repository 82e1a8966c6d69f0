#![deny(missing_docs)]

//! # DynamoDB Mapper
//!
//! A client-side data-mapping layer for DynamoDB-style key-value stores.
//!
//! ## Overview
//!
//! This library translates typed application records to and from the
//! store's tagged wire format and builds, paginates, and merges the
//! requests that carry them:
//!
//! - A schema-driven attribute codec over a closed set of semantic types
//! - Condition and update-expression builders that produce protocol-exact
//!   nested structures
//! - Fluent query/scan plans with cursor-based pagination, in buffered or
//!   page-stream form
//! - N-way parallel scanning with a deterministic merge
//! - Chunked batch retrieval with unprocessed-key and retryable-error
//!   recovery
//!
//! The network itself lives behind the [`transport::Transport`] trait;
//! this crate never opens a connection.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dynamodb_mapper::condition::Condition;
//! use dynamodb_mapper::read::query::QueryPlan;
//! use dynamodb_mapper::schema::{AttributeDefinition, Schema, SemanticType, Table};
//! use indexmap::IndexMap;
//! use serde_json::json;
//!
//! # async fn example(
//! #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
//! # ) -> Result<(), dynamodb_mapper::error::Error> {
//! let schema = Schema::new(
//!     IndexMap::from([
//!         ("stream".to_string(), AttributeDefinition::hash_key(SemanticType::String)),
//!         ("sequence".to_string(), AttributeDefinition::range_key(SemanticType::Number)),
//!     ]),
//!     IndexMap::new(),
//!     IndexMap::new(),
//! )?;
//! let table = Arc::new(Table::new("events", schema));
//!
//! let result = QueryPlan::new(table, transport, json!("orders"))
//!     .where_key("sequence", Condition::GreaterThan(json!(100)))
//!     .load_all()
//!     .exec()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@schema`] - Attribute semantic types, key roles, and index layout
//! - [`mod@codec`] - Encoding and decoding between records and wire values
//! - [`mod@condition`] - Key-condition and filter fragments
//! - [`mod@expression`] - Update-expression parsing and serialization
//! - [`mod@read`] - Read operations (GetItem, Query, Scan, ParallelScan, BatchGetItem)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, DeleteItem)
//! - [`mod@transport`] - The asynchronous store collaborator
//! - [`mod@types`] - Wire-format request and response types

/// Bidirectional mapping between typed records and wire attribute values.
pub mod codec;

/// Condition fragments for key conditions and filters.
pub mod condition;

/// Error types for request building, decoding, and transport failures.
pub mod error;

/// Update-expression parsing, serialization, and stringification.
pub mod expression;

/// Read operations for retrieving data from tables.
pub mod read;

/// Table schema and index layout.
pub mod schema;

/// The asynchronous transport collaborator.
pub mod transport;

/// Wire-format types exchanged with the transport.
pub mod types;

/// Write operations for modifying data in tables.
pub mod write;
