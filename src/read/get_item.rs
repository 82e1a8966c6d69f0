use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::schema::Table;
use crate::transport::{Transport, retry_transport};
use crate::types::{GetItemRequest, GetItemResponse, ReturnConsumedCapacity};

/// Single-item read by primary key.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::read::get_item::GetItemPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let response = GetItemPlan::new(table, transport, json!("a@x"), None)
///     .consistent_read(true)
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct GetItemPlan {
    attributes_to_get: Option<Vec<String>>,
    consistent_read: Option<bool>,
    hash_value: Value,
    range_value: Option<Value>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl GetItemPlan {
    /// Start a read for the given key values.
    ///
    /// `hash_value` may also be an object carrying both key fields, in
    /// which case `range_value` is ignored.
    pub fn new(
        table: Arc<Table>,
        transport: Arc<dyn Transport>,
        hash_value: Value,
        range_value: Option<Value>,
    ) -> Self {
        Self {
            attributes_to_get: None,
            consistent_read: None,
            hash_value,
            range_value,
            return_consumed_capacity: None,
            table,
            transport,
        }
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

    /// Build the wire request descriptor.
    pub fn build_request(&self) -> Result<GetItemRequest> {
        let key = codec::build_key(
            &self.hash_value,
            self.range_value.as_ref(),
            self.table.schema(),
        )?;
        Ok(GetItemRequest {
            attributes_to_get: self.attributes_to_get.clone(),
            consistent_read: self.consistent_read,
            key,
            return_consumed_capacity: self.return_consumed_capacity,
            table_name: self.table.table_name().to_string(),
        })
    }

    /// Execute the read.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.get_item", skip(self), err)
    )]
    pub async fn exec(self) -> Result<GetItemResponse> {
        let request = self.build_request()?;
        retry_transport(|| self.transport.get_item(request.clone())).await
    }
}
