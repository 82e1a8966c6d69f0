use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::schema::Table;
use crate::transport::{Transport, retry_transport};
use crate::types::{
    AttributeValue, DeleteItemRequest, ReturnConsumedCapacity, ReturnValues, WriteResponse,
};

/// Delete operation: remove one item by primary key.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::write::delete_item::DeleteItemPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// DeleteItemPlan::new(table, transport, json!("a@x"), None)
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct DeleteItemPlan {
    condition_expression: Option<String>,
    expression_attribute_names: HashMap<String, String>,
    expression_attribute_values: HashMap<String, AttributeValue>,
    hash_value: Value,
    range_value: Option<Value>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_values: Option<ReturnValues>,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl DeleteItemPlan {
    /// Start a delete for the given key values.
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
            condition_expression: None,
            expression_attribute_names: HashMap::new(),
            expression_attribute_values: HashMap::new(),
            hash_value,
            range_value,
            return_consumed_capacity: None,
            return_values: None,
            table,
            transport,
        }
    }

    /// Require a condition to hold for the delete to succeed.
    pub fn condition_expression(mut self, expression: impl Into<String>) -> Self {
        self.condition_expression = Some(expression.into());
        self
    }

    /// Supply name placeholders for the condition expression.
    pub fn expression_names(mut self, names: HashMap<String, String>) -> Self {
        self.expression_attribute_names.extend(names);
        self
    }

    /// Supply value placeholders for the condition expression.
    pub fn expression_values(mut self, values: HashMap<String, AttributeValue>) -> Self {
        self.expression_attribute_values.extend(values);
        self
    }

    /// Which attributes of the deleted item to return.
    pub fn return_values(mut self, values: ReturnValues) -> Self {
        self.return_values = Some(values);
        self
    }

    /// Request consumed-capacity accounting.
    pub fn return_consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(level);
        self
    }

    /// Build the wire request descriptor.
    pub fn build_request(&self) -> Result<DeleteItemRequest> {
        let key = codec::build_key(
            &self.hash_value,
            self.range_value.as_ref(),
            self.table.schema(),
        )?;
        Ok(DeleteItemRequest {
            condition_expression: self.condition_expression.clone(),
            expression_attribute_names: self.expression_attribute_names.clone(),
            expression_attribute_values: self.expression_attribute_values.clone(),
            key,
            return_consumed_capacity: self.return_consumed_capacity,
            return_values: self.return_values,
            table_name: self.table.table_name().to_string(),
        })
    }

    /// Execute the delete.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.delete_item", skip(self), err)
    )]
    pub async fn exec(self) -> Result<WriteResponse> {
        let request = self.build_request()?;
        retry_transport(|| self.transport.delete_item(request.clone())).await
    }
}
