use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec;
use crate::error::Result;
use crate::expression;
use crate::schema::Table;
use crate::transport::{Transport, retry_transport};
use crate::types::{
    AttributeAction, AttributeValue, ReturnConsumedCapacity, ReturnValues, UpdateItemRequest,
    WriteResponse,
};

/// How the record's changes are rendered on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum UpdateMode {
    /// Legacy per-attribute `{Action, Value}` map.
    AttributeUpdates,
    /// `SET`/`ADD`/`REMOVE`/`DELETE` update expression with placeholders.
    #[default]
    Expression,
}

/// Update operation: apply a change delta to one item.
///
/// The record must carry the key attributes; they identify the item and
/// are excluded from the serialized changes. In the default expression
/// mode, a `null` attribute becomes a `REMOVE`, `{"$add": x}` an `ADD`,
/// `{"$del": x}` a `DELETE`, and anything else a `SET`.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::types::ReturnValues;
/// use dynamodb_mapper::write::update_item::UpdateItemPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let record = json!({"email": "a@x", "age": {"$add": 1}, "nickname": null});
/// let response = UpdateItemPlan::new(table, transport, record.as_object().unwrap().clone())
///     .return_values(ReturnValues::AllNew)
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct UpdateItemPlan {
    condition_expression: Option<String>,
    expression_attribute_names: HashMap<String, String>,
    expression_attribute_values: HashMap<String, AttributeValue>,
    mode: UpdateMode,
    record: Map<String, Value>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_values: Option<ReturnValues>,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl UpdateItemPlan {
    /// Start an update for the given record.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>, record: Map<String, Value>) -> Self {
        Self {
            condition_expression: None,
            expression_attribute_names: HashMap::new(),
            expression_attribute_values: HashMap::new(),
            mode: UpdateMode::default(),
            record,
            return_consumed_capacity: None,
            return_values: None,
            table,
            transport,
        }
    }

    /// Render the changes as a legacy per-attribute `{Action, Value}` map
    /// instead of an update expression.
    pub fn legacy_attribute_updates(mut self) -> Self {
        self.mode = UpdateMode::AttributeUpdates;
        self
    }

    /// Require a condition to hold for the update to succeed.
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

    /// Which attributes to return.
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
    pub fn build_request(&self) -> Result<UpdateItemRequest> {
        let schema = self.table.schema();
        let key = codec::build_key(&Value::Object(self.record.clone()), None, schema)?;
        let mut request = UpdateItemRequest {
            condition_expression: self.condition_expression.clone(),
            expression_attribute_names: self.expression_attribute_names.clone(),
            expression_attribute_values: self.expression_attribute_values.clone(),
            key,
            return_consumed_capacity: self.return_consumed_capacity,
            return_values: self.return_values,
            table_name: self.table.table_name().to_string(),
            ..Default::default()
        };
        match self.mode {
            UpdateMode::AttributeUpdates => {
                request.attribute_updates = codec::serialize_item_for_update(
                    schema,
                    AttributeAction::Put,
                    &self.record,
                )?;
            }
            UpdateMode::Expression => {
                let serialized = expression::serialize_update_expression(schema, &self.record)?;
                if !serialized.is_empty() {
                    request.update_expression = Some(serialized.expression());
                    request
                        .expression_attribute_names
                        .extend(serialized.attribute_names);
                    request
                        .expression_attribute_values
                        .extend(serialized.attribute_values);
                }
            }
        }
        Ok(request)
    }

    /// Execute the update.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.update_item", skip(self), err)
    )]
    pub async fn exec(self) -> Result<WriteResponse> {
        let request = self.build_request()?;
        retry_transport(|| self.transport.update_item(request.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeDefinition, Schema, SemanticType};
    use crate::transport::testing::MockTransport;
    use crate::types::{AttributeUpdate, ItemKey};

    use indexmap::IndexMap;
    use serde_json::json;

    fn account_table() -> Arc<Table> {
        let schema = Schema::new(
            IndexMap::from([
                (
                    "email".to_string(),
                    AttributeDefinition::hash_key(SemanticType::String),
                ),
                (
                    "age".to_string(),
                    AttributeDefinition::plain(SemanticType::Number),
                ),
                (
                    "nickname".to_string(),
                    AttributeDefinition::plain(SemanticType::String),
                ),
            ]),
            IndexMap::new(),
            IndexMap::new(),
        )
        .unwrap();
        Arc::new(Table::new("accounts", schema))
    }

    #[test]
    fn test_build_request_expression_mode() {
        let record = json!({"email": "a@x", "age": {"$add": 1}, "nickname": null})
            .as_object()
            .unwrap()
            .clone();
        let request =
            UpdateItemPlan::new(account_table(), Arc::new(MockTransport::new()), record)
                .build_request()
                .unwrap();
        assert_eq!(
            request.key,
            ItemKey::from([(
                "email".to_string(),
                AttributeValue::S("a@x".to_string())
            )])
        );
        assert_eq!(
            request.update_expression.as_deref(),
            Some("ADD #age :age REMOVE #nickname")
        );
        assert_eq!(
            request.expression_attribute_names,
            HashMap::from([
                ("#age".to_string(), "age".to_string()),
                ("#nickname".to_string(), "nickname".to_string()),
            ])
        );
        assert_eq!(
            request.expression_attribute_values,
            HashMap::from([(":age".to_string(), AttributeValue::N("1".to_string()))])
        );
        assert!(request.attribute_updates.is_empty());
    }

    #[test]
    fn test_build_request_legacy_mode() {
        let record = json!({"email": "a@x", "age": 31, "nickname": null})
            .as_object()
            .unwrap()
            .clone();
        let request =
            UpdateItemPlan::new(account_table(), Arc::new(MockTransport::new()), record)
                .legacy_attribute_updates()
                .build_request()
                .unwrap();
        assert!(request.update_expression.is_none());
        assert_eq!(
            request.attribute_updates,
            HashMap::from([
                (
                    "age".to_string(),
                    AttributeUpdate {
                        action: AttributeAction::Put,
                        value: Some(AttributeValue::N("31".to_string())),
                    }
                ),
                (
                    "nickname".to_string(),
                    AttributeUpdate {
                        action: AttributeAction::Delete,
                        value: None,
                    }
                ),
            ])
        );
    }

    #[test]
    fn test_build_request_with_no_changes_omits_the_expression() {
        let record = json!({"email": "a@x"}).as_object().unwrap().clone();
        let request =
            UpdateItemPlan::new(account_table(), Arc::new(MockTransport::new()), record)
                .build_request()
                .unwrap();
        assert!(request.update_expression.is_none());
        assert!(request.expression_attribute_names.is_empty());
    }

    #[tokio::test]
    async fn test_exec_returns_attributes() {
        let transport = Arc::new(MockTransport::new());
        transport
            .update_responses
            .lock()
            .unwrap()
            .push_back(Ok(WriteResponse {
                attributes: Some(ItemKey::from([(
                    "age".to_string(),
                    AttributeValue::N("31".to_string()),
                )])),
                ..Default::default()
            }));
        let record = json!({"email": "a@x", "age": 31}).as_object().unwrap().clone();
        let response = UpdateItemPlan::new(account_table(), transport.clone(), record)
            .return_values(ReturnValues::UpdatedNew)
            .exec()
            .await
            .unwrap();
        assert!(response.attributes.is_some());
        let calls = transport.update_calls.lock().unwrap();
        assert_eq!(calls[0].return_values, Some(ReturnValues::UpdatedNew));
    }
}
