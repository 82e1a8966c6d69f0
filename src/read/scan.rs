use std::sync::Arc;

use futures::Stream;

use crate::condition::{Condition, merge_fragment};
use crate::error::Result;
use crate::read::pages;
use crate::schema::Table;
use crate::transport::Transport;
use crate::types::{ItemKey, ResultPage, ReturnConsumedCapacity, ScanRequest};

/// Scan operation: a full-table traversal with independent filter
/// conditions.
///
/// Unlike a query there is no implicit hash-key condition — every
/// condition is a plain filter. The plan carries `segment`/`total_segments`
/// so it can participate in a parallel scan; the pagination contract is
/// identical to [`QueryPlan`](crate::read::query::QueryPlan).
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dynamodb_mapper::condition::Condition;
/// use dynamodb_mapper::read::scan::ScanPlan;
/// use serde_json::json;
///
/// # async fn example(
/// #     table: Arc<dynamodb_mapper::schema::Table>,
/// #     transport: Arc<dyn dynamodb_mapper::transport::Transport>,
/// # ) -> Result<(), dynamodb_mapper::error::Error> {
/// let result = ScanPlan::new(table, transport)
///     .filter("age", Condition::GreaterThan(json!(21)))
///     .load_all()
///     .exec()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ScanPlan {
    filters: Vec<(String, Condition)>,
    load_all: bool,
    request: ScanRequest,
    table: Arc<Table>,
    transport: Arc<dyn Transport>,
}

impl ScanPlan {
    /// Start a scan of the whole table.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>) -> Self {
        let request = ScanRequest {
            table_name: table.table_name().to_string(),
            ..Default::default()
        };
        Self {
            filters: Vec::new(),
            load_all: false,
            request,
            table,
            transport,
        }
    }

    /// Add a filter condition applied to every scanned item.
    pub fn filter(mut self, attribute: impl Into<String>, condition: Condition) -> Self {
        self.filters.push((attribute.into(), condition));
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

    /// Scan only one segment of a parallel scan.
    pub fn segments(mut self, segment: i32, total_segments: i32) -> Self {
        self.request.segment = Some(segment);
        self.request.total_segments = Some(total_segments);
        self
    }

    /// Follow continuation cursors until the traversal is exhausted.
    pub fn load_all(mut self) -> Self {
        self.load_all = true;
        self
    }

    /// Pin this plan to segment `segment` of `total_segments` and force a
    /// full traversal, for parallel-scan participation.
    pub(crate) fn pinned(self, segment: i32, total_segments: i32) -> Self {
        self.segments(segment, total_segments).load_all()
    }

    /// Build the wire request descriptor.
    pub fn build_request(&self) -> Result<ScanRequest> {
        let schema = self.table.schema();
        let mut request = self.request.clone();
        for (attribute, condition) in &self.filters {
            let fragment = condition.to_fragment(attribute, schema)?;
            merge_fragment(&mut request.scan_filter, attribute, fragment);
        }
        Ok(request)
    }

    /// Stream the traversal one page at a time.
    pub fn pages(self) -> Result<impl Stream<Item = Result<ResultPage>>> {
        let base = self.build_request()?;
        let transport = self.transport;
        let issue = move |cursor: Option<ItemKey>| {
            let transport = transport.clone();
            let mut request = base.clone();
            async move {
                request.exclusive_start_key = cursor;
                transport.scan(request).await
            }
        };
        Ok(pages::page_stream(self.load_all, issue))
    }

    /// Execute the scan, buffering until the traversal finishes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.scan", skip(self), err)
    )]
    pub async fn exec(self) -> Result<ResultPage> {
        pages::collect_pages(self.pages()?).await
    }
}
