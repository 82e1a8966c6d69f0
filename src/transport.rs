//! The transport collaborator: the asynchronous surface of the remote
//! store.
//!
//! The mapper never talks to a network itself; every plan hands its fully
//! built wire request to a [`Transport`] implementation and interprets the
//! response. Timeouts, connection management, and signing all live behind
//! this trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{
    BatchGetItemRequest, BatchGetResponse, DeleteItemRequest, GetItemRequest, GetItemResponse,
    PutItemRequest, QueryRequest, ResultPage, ScanRequest, UpdateItemRequest, WriteResponse,
};

/// Asynchronous store operations consumed by the plans.
///
/// Errors may be flagged retryable; that flag is the sole trigger for the
/// mapper's local reissue of an outstanding request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read one item by primary key.
    async fn get_item(&self, request: GetItemRequest) -> Result<GetItemResponse, TransportError>;

    /// Store one item, replacing any existing item with the same key.
    async fn put_item(&self, request: PutItemRequest) -> Result<WriteResponse, TransportError>;

    /// Apply attribute updates to one item.
    async fn update_item(
        &self,
        request: UpdateItemRequest,
    ) -> Result<WriteResponse, TransportError>;

    /// Delete one item by primary key.
    async fn delete_item(
        &self,
        request: DeleteItemRequest,
    ) -> Result<WriteResponse, TransportError>;

    /// Run one page of a query.
    async fn query(&self, request: QueryRequest) -> Result<ResultPage, TransportError>;

    /// Run one page of a scan.
    async fn scan(&self, request: ScanRequest) -> Result<ResultPage, TransportError>;

    /// Read a batch of items by key, possibly leaving some unprocessed.
    async fn batch_get_item(
        &self,
        request: BatchGetItemRequest,
    ) -> Result<BatchGetResponse, TransportError>;
}

/// Reissue a transport call while it fails with a retryable error.
///
/// The retryable flag is the sole trigger; the request is reissued
/// identically and the recovery is invisible to the caller except as added
/// latency. Non-retryable errors are terminal.
pub(crate) async fn retry_transport<T, F, Fut>(mut call: F) -> crate::error::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    loop {
        match call().await {
            Err(error) if error.retryable => continue,
            Err(error) => return Err(error.into()),
            Ok(value) => return Ok(value),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A scripted in-memory transport: tests enqueue per-operation
    //! responses and assert on the recorded requests afterwards.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub(crate) batch_get_calls: Mutex<Vec<BatchGetItemRequest>>,
        pub(crate) batch_get_responses:
            Mutex<VecDeque<Result<BatchGetResponse, TransportError>>>,
        pub(crate) delete_calls: Mutex<Vec<DeleteItemRequest>>,
        pub(crate) delete_responses: Mutex<VecDeque<Result<WriteResponse, TransportError>>>,
        pub(crate) get_calls: Mutex<Vec<GetItemRequest>>,
        pub(crate) get_responses: Mutex<VecDeque<Result<GetItemResponse, TransportError>>>,
        pub(crate) put_calls: Mutex<Vec<PutItemRequest>>,
        pub(crate) put_responses: Mutex<VecDeque<Result<WriteResponse, TransportError>>>,
        pub(crate) query_calls: Mutex<Vec<QueryRequest>>,
        pub(crate) query_responses: Mutex<VecDeque<Result<ResultPage, TransportError>>>,
        pub(crate) scan_calls: Mutex<Vec<ScanRequest>>,
        pub(crate) scan_responses: Mutex<VecDeque<Result<ResultPage, TransportError>>>,
        pub(crate) update_calls: Mutex<Vec<UpdateItemRequest>>,
        pub(crate) update_responses: Mutex<VecDeque<Result<WriteResponse, TransportError>>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        fn pop<T>(
            queue: &Mutex<VecDeque<Result<T, TransportError>>>,
            operation: &str,
        ) -> Result<T, TransportError> {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected {operation} call"))
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get_item(
            &self,
            request: GetItemRequest,
        ) -> Result<GetItemResponse, TransportError> {
            self.get_calls.lock().unwrap().push(request);
            Self::pop(&self.get_responses, "get_item")
        }

        async fn put_item(
            &self,
            request: PutItemRequest,
        ) -> Result<WriteResponse, TransportError> {
            self.put_calls.lock().unwrap().push(request);
            Self::pop(&self.put_responses, "put_item")
        }

        async fn update_item(
            &self,
            request: UpdateItemRequest,
        ) -> Result<WriteResponse, TransportError> {
            self.update_calls.lock().unwrap().push(request);
            Self::pop(&self.update_responses, "update_item")
        }

        async fn delete_item(
            &self,
            request: DeleteItemRequest,
        ) -> Result<WriteResponse, TransportError> {
            self.delete_calls.lock().unwrap().push(request);
            Self::pop(&self.delete_responses, "delete_item")
        }

        async fn query(&self, request: QueryRequest) -> Result<ResultPage, TransportError> {
            self.query_calls.lock().unwrap().push(request);
            Self::pop(&self.query_responses, "query")
        }

        async fn scan(&self, request: ScanRequest) -> Result<ResultPage, TransportError> {
            self.scan_calls.lock().unwrap().push(request);
            Self::pop(&self.scan_responses, "scan")
        }

        async fn batch_get_item(
            &self,
            request: BatchGetItemRequest,
        ) -> Result<BatchGetResponse, TransportError> {
            self.batch_get_calls.lock().unwrap().push(request);
            Self::pop(&self.batch_get_responses, "batch_get_item")
        }
    }
}
