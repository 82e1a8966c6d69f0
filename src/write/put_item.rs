use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::{self, EncodeOptions};
use crate::error::Result;
use crate::schema::Table;
use crate::transport::{Transport, retry_transport};
use crate::types::{
    AttributeValue, PutItemRequest, ReturnConsumedCapacity, ReturnValues, WriteResponse,
};

/// Put operation: store a record, replacing any item with the same key.
///
/// Only attributes present in the record are encoded; absent attributes
/// are omitted, never defaulted.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::write::put_item::PutItemPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let record = json!({"email": "a@x", "age": 30});
/// PutItemPlan::new(table, transport, record.as_object().unwrap().clone())
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct PutItemPlan {
    condition_expression: Option<String>,
    expression_attribute_names: HashMap<String, String>,
    expression_attribute_values: HashMap<String, AttributeValue>,
    record: Map<String, Value>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_values: Option<ReturnValues>,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl PutItemPlan {
    /// Start a put of the given record.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>, record: Map<String, Value>) -> Self {
        Self {
            condition_expression: None,
            expression_attribute_names: HashMap::new(),
            expression_attribute_values: HashMap::new(),
            record,
            return_consumed_capacity: None,
            return_values: None,
            table,
            transport,
        }
    }

    /// Require a condition to hold for the put to succeed.
    ///
    /// Placeholders used by the expression are supplied through
    /// [`expression_names`](Self::expression_names) and
    /// [`expression_values`](Self::expression_values).
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

    /// Which attributes of a replaced item to return.
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
    pub fn build_request(&self) -> Result<PutItemRequest> {
        let item = codec::serialize_item(
            self.table.schema(),
            &self.record,
            EncodeOptions::default(),
        )?;
        Ok(PutItemRequest {
            condition_expression: self.condition_expression.clone(),
            expression_attribute_names: self.expression_attribute_names.clone(),
            expression_attribute_values: self.expression_attribute_values.clone(),
            item,
            return_consumed_capacity: self.return_consumed_capacity,
            return_values: self.return_values,
            table_name: self.table.table_name().to_string(),
        })
    }

    /// Execute the put.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.put_item", skip(self), err)
    )]
    pub async fn exec(self) -> Result<WriteResponse> {
        let request = self.build_request()?;
        retry_transport(|| self.transport.put_item(request.clone())).await
    }
}
