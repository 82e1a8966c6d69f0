use std::sync::Arc;

use futures::future::try_join_all;

use crate::condition::Condition;
use crate::error::Result;
use crate::read::pages;
use crate::read::scan::ScanPlan;
use crate::schema::Table;
use crate::transport::Transport;
use crate::types::{ResultPage, ReturnConsumedCapacity};

/// Parallel scan: fans one scan out over `N` table segments and merges the
/// terminal results.
///
/// The base request is deep-copied into one [`ScanPlan`] per segment, each
/// pinned to segment *i* of *N* with `load_all` forced, and all segments
/// run concurrently as a join. There is no partial-success mode: the first
/// segment failure aborts the whole operation. Items concatenate with
/// undefined inter-segment order; counts and capacity units sum, and the
/// capacity field is omitted entirely when the summed units are zero.
pub struct ParallelScanPlan {
    base: ScanPlan,
    total_segments: i32,
}

impl ParallelScanPlan {
    /// Start a parallel scan over `total_segments` disjoint segments.
    ///
    /// # Panics
    ///
    /// Panics when `total_segments` is not positive; that is a programming
    /// error, not a runtime failure.
    pub fn new(table: Arc<Table>, transport: Arc<dyn Transport>, total_segments: i32) -> Self {
        assert!(
            total_segments > 0,
            "total_segments must be greater than 0"
        );
        Self {
            base: ScanPlan::new(table, transport),
            total_segments,
        }
    }

    /// Add a filter condition applied to every scanned item.
    pub fn filter(mut self, attribute: impl Into<String>, condition: Condition) -> Self {
        self.base = self.base.filter(attribute, condition);
        self
    }

    /// Retrieve only the named attributes.
    pub fn attributes(mut self, attributes: Vec<String>) -> Self {
        self.base = self.base.attributes(attributes);
        self
    }

    /// Limit the number of items each segment evaluates per page.
    ///
    /// # Panics
    ///
    /// Panics when `limit` is not positive.
    pub fn limit(mut self, limit: i32) -> Self {
        self.base = self.base.limit(limit);
        self
    }

    /// Request consumed-capacity accounting.
    pub fn return_consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
        self.base = self.base.return_consumed_capacity(level);
        self
    }

    /// Run all segments concurrently and merge their results.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.parallel_scan", skip(self), err)
    )]
    pub async fn exec(self) -> Result<ResultPage> {
        let Self {
            base,
            total_segments,
        } = self;
        let segments = (0..total_segments)
            .map(|segment| base.clone().pinned(segment, total_segments).exec());
        let results = try_join_all(segments).await?;
        let mut merged = ResultPage::default();
        for result in results {
            pages::merge_page(&mut merged, result);
        }
        merged.last_evaluated_key = None;
        let summed_units = merged
            .consumed_capacity
            .as_ref()
            .and_then(|capacity| capacity.capacity_units)
            .unwrap_or(0.0);
        if summed_units == 0.0 {
            merged.consumed_capacity = None;
        }
        Ok(merged)
    }
}
