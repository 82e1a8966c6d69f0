use std::sync::Arc;

use futures::Stream;
use serde_json::Value;

use crate::condition::{Condition, merge_fragment};
use crate::error::Result;
use crate::read::pages;
use crate::schema::Table;
use crate::transport::Transport;
use crate::types::{ItemKey, QueryRequest, ResultPage, ReturnConsumedCapacity};

/// Query operation: a fluent request builder with pagination-aware
/// execution.
///
/// The plan owns its request descriptor; each chain call mutates and
/// returns the plan, and `exec`/`pages` consume it, so one descriptor is
/// never shared between two in-flight executions.
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::condition::Condition;
/// use dynamodb_mapper::read::query::QueryPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let result = QueryPlan::new(table, transport, json!("orders"))
///     .where_key("sequence", Condition::Between(json!(5), json!(10)))
///     .load_all()
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryPlan {
    filters: Vec<(String, Condition)>,
    hash_value: Value,
    key_conditions: Vec<(String, Condition)>,
    load_all: bool,
    request: QueryRequest,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl QueryPlan {
    /// Start a query for the given hash-key value.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>, hash_value: Value) -> Self {
        let request = QueryRequest {
            table_name: table.table_name().to_string(),
            ..Default::default()
        };
        Self {
            filters: Vec::new(),
            hash_value,
            key_conditions: Vec::new(),
            load_all: false,
            request,
            table,
            transport,
        }
    }

    /// Add a key condition, usually on the range key.
    pub fn where_key(mut self, attribute: impl Into<String>, condition: Condition) -> Self {
        self.key_conditions.push((attribute.into(), condition));
        self
    }

    /// Add a filter applied after the key conditions.
    pub fn filter(mut self, attribute: impl Into<String>, condition: Condition) -> Self {
        self.filters.push((attribute.into(), condition));
        self
    }

    /// Query the named index instead of the base table.
    pub fn using_index(mut self, index_name: impl Into<String>) -> Self {
        self.request.index_name = Some(index_name.into());
        self
    }

    /// Use strongly consistent reads.
    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.request.consistent_read = Some(consistent);
        self
    }

    /// Retrieve only the named attributes.
    pub fn attributes(mut self, attributes: Vec<String>) -> Self {
        self.request.attributes_to_get = Some(attributes);
        self
    }

    /// Limit the number of items evaluated per page.
    ///
    /// # Panics
    ///
    /// Panics when `limit` is not positive; that is a programming error,
    /// not a runtime failure.
    pub fn limit(mut self, limit: i32) -> Self {
        assert!(limit > 0, "limit must be greater than 0");
        self.request.limit = Some(limit);
        self
    }

    /// Sort ascending on the range key.
    pub fn ascending(mut self) -> Self {
        self.request.scan_index_forward = Some(true);
        self
    }

    /// Sort descending on the range key.
    pub fn descending(mut self) -> Self {
        self.request.scan_index_forward = Some(false);
        self
    }

    /// Resume from a continuation cursor of a previous traversal.
    pub fn start_key(mut self, cursor: ItemKey) -> Self {
        self.request.exclusive_start_key = Some(cursor);
        self
    }

    /// Request consumed-capacity accounting.
    pub fn return_consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
        self.request.return_consumed_capacity = Some(level);
        self
    }

    /// Follow continuation cursors until the traversal is exhausted.
    pub fn load_all(mut self) -> Self {
        self.load_all = true;
        self
    }

    /// Build the wire request descriptor.
    ///
    /// Always injects an equality condition on the active hash key — the
    /// table's own hash key or, when an index is selected, that index's
    /// hash key — merged last over any explicit conditions.
    pub fn build_request(&self) -> Result<QueryRequest> {
        let schema = self.table.schema();
        let mut request = self.request.clone();
        for (attribute, condition) in &self.filters {
            let fragment = condition.to_fragment(attribute, schema)?;
            merge_fragment(&mut request.query_filter, attribute, fragment);
        }
        for (attribute, condition) in &self.key_conditions {
            let fragment = condition.to_fragment(attribute, schema)?;
            merge_fragment(&mut request.key_conditions, attribute, fragment);
        }
        let hash_attribute = match &request.index_name {
            Some(name) => schema
                .index(name)
                .map_or(schema.hash_key(), |index| index.hash_key.as_str()),
            None => schema.hash_key(),
        };
        let hash_fragment =
            Condition::Equals(self.hash_value.clone()).to_fragment(hash_attribute, schema)?;
        merge_fragment(&mut request.key_conditions, hash_attribute, hash_fragment);
        Ok(request)
    }

    /// Stream the traversal one page at a time.
    ///
    /// Consumers can start processing before the traversal completes; a
    /// consumer that stops pulling simply ends the loop.
    pub fn pages(self) -> Result<impl Stream<Item = Result<ResultPage>>> {
        let base = self.build_request()?;
        let transport = self.transport;
        let issue = move |cursor: Option<ItemKey>| {
            let transport = transport.clone();
            let mut request = base.clone();
            async move {
                request.exclusive_start_key = cursor;
                transport.query(request).await
            }
        };
        Ok(pages::page_stream(self.load_all, issue))
    }

    /// Execute the query, buffering until the traversal finishes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.query", skip(self), err)
    )]
    pub async fn exec(self) -> Result<ResultPage> {
        pages::collect_pages(self.pages()?).await
    }
}
