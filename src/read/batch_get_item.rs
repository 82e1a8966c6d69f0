use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::read::pages;
use crate::schema::Table;
use crate::transport::{Transport, retry_transport};
use crate::types::{
    BatchGetItemRequest, ConsumedCapacity, Item, KeysAndAttributes, ReturnConsumedCapacity,
};

/// The transport's per-call key limit for batch gets.
const MAX_KEYS_PER_CALL: usize = 100;

/// The merged outcome of a batch get.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetResult {
    /// Summed capacity across every round trip, when reported.
    pub consumed_capacity: Option<ConsumedCapacity>,
    /// All retrieved items. Within one chunk items keep the store's
    /// response order; cross-chunk ordering is not guaranteed.
    pub items: Vec<Item>,
}

/// Batch get operation: chunked retrieval of an arbitrary key list.
///
/// The key list is partitioned into transport-sized chunks; chunks run
/// concurrently, and each chunk reissues the store's unprocessed keys
/// until none remain. The caller's key list is never mutated — the plan
/// operates on a defensive copy.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::read::batch_get_item::BatchGetPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let keys = vec![json!("a@x"), json!("b@x")];
/// let result = BatchGetPlan::new(table, transport).keys(&keys).exec().await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchGetPlan {
    attributes_to_get: Option<Vec<String>>,
    consistent_read: Option<bool>,
    keys: Vec<Value>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl BatchGetPlan {
    /// Start a batch get against the table.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>) -> Self {
        Self {
            attributes_to_get: None,
            consistent_read: None,
            keys: Vec::new(),
            return_consumed_capacity: None,
            table,
            transport,
        }
    }

    /// Add keys to retrieve.
    ///
    /// Each key is either a hash-key scalar or an object carrying the key
    /// fields, exactly as [`codec::build_key`] accepts them. The slice is
    /// copied; the caller's list is left untouched.
    pub fn keys(mut self, keys: &[Value]) -> Self {
        self.keys.extend_from_slice(keys);
        self
    }

    /// Use strongly consistent reads.
    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    /// Retrieve only the named attributes.
    pub fn attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes_to_get = Some(attributes);
        self
    }

    /// Request consumed-capacity accounting.
    pub fn return_consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(level);
        self
    }

    /// Retrieve every key, chunk by chunk.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.batch_get_item", skip(self), err)
    )]
    pub async fn exec(self) -> Result<BatchGetResult> {
        let schema = self.table.schema();
        let wire_keys = self
            .keys
            .iter()
            .map(|key| codec::build_key(key, None, schema))
            .collect::<Result<Vec<_>>>()?;
        let table_name = self.table.table_name().to_string();
        let chunks = wire_keys
            .chunks(MAX_KEYS_PER_CALL)
            .map(|chunk| {
                fetch_chunk(
                    self.transport.clone(),
                    table_name.clone(),
                    KeysAndAttributes {
                        attributes_to_get: self.attributes_to_get.clone(),
                        consistent_read: self.consistent_read,
                        keys: chunk.to_vec(),
                    },
                    self.return_consumed_capacity,
                )
            })
            .collect::<Vec<_>>();
        let mut result = BatchGetResult::default();
        for (items, capacity) in try_join_all(chunks).await? {
            result.items.extend(items);
            result.consumed_capacity = pages::add_capacity(result.consumed_capacity, capacity);
        }
        Ok(result)
    }
}

/// Drain one chunk: reissue the transport's unprocessed keys until none
/// remain, reissuing identically on retryable errors.
async fn fetch_chunk(
    transport: Arc<dyn Transport>,
    table_name: String,
    mut reads: KeysAndAttributes,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
) -> Result<(Vec<Item>, Option<ConsumedCapacity>)> {
    let mut items = Vec::new();
    let mut capacity = None;
    while !reads.keys.is_empty() {
        let request = BatchGetItemRequest {
            request_items: HashMap::from([(table_name.clone(), reads.clone())]),
            return_consumed_capacity,
        };
        let mut response =
            retry_transport(|| transport.batch_get_item(request.clone())).await?;
        if let Some(found) = response.responses.remove(&table_name) {
            items.extend(found);
        }
        for reported in response.consumed_capacity {
            capacity = pages::add_capacity(capacity, Some(reported));
        }
        reads.keys = response
            .unprocessed_keys
            .remove(&table_name)
            .map(|unprocessed| unprocessed.keys)
            .unwrap_or_default();
    }
    Ok((items, capacity))
}
