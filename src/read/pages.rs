//! The generic continuation-following loop shared by query and scan
//! traversals.
//!
//! The page stream is the primitive: it yields one [`ResultPage`] per
//! round trip and requests page *k+1* only after page *k*'s cursor is
//! known, so there is never more than one outstanding request per
//! traversal. Buffered execution is derived by folding the stream, which
//! keeps that invariant in a single place.

use futures::{Stream, TryStreamExt, stream};

use crate::error::{Error, Result, TransportError};
use crate::transport::retry_transport;
use crate::types::{ConsumedCapacity, ItemKey, ResultPage};

/// Stream the pages of one traversal.
///
/// `issue` performs one round trip from the given continuation cursor. A
/// retryable transport error causes an identical reissue of the
/// outstanding request; a non-retryable one ends the stream with an error.
/// The stream ends after the first page when `load_all` is false, and
/// otherwise when a page carries no cursor.
pub(crate) fn page_stream<F, Fut>(
    load_all: bool,
    issue: F,
) -> impl Stream<Item = Result<ResultPage>>
where
    F: FnMut(Option<ItemKey>) -> Fut,
    Fut: Future<Output = Result<ResultPage, TransportError>>,
{
    let state = (issue, None::<ItemKey>, false);
    stream::try_unfold(state, move |(mut issue, cursor, done)| async move {
        if done {
            return Ok(None);
        }
        let page = retry_transport(|| issue(cursor.clone())).await?;
        let next_cursor = page.last_evaluated_key.clone();
        let done = !load_all || next_cursor.is_none();
        Ok(Some((page, (issue, next_cursor, done))))
    })
}

/// Fold a page stream into one merged result.
pub(crate) async fn collect_pages<S>(pages: S) -> Result<ResultPage>
where
    S: Stream<Item = Result<ResultPage, Error>>,
{
    futures::pin_mut!(pages);
    let mut merged = ResultPage::default();
    while let Some(page) = pages.try_next().await? {
        merge_page(&mut merged, page);
    }
    Ok(merged)
}

/// Merge one page into the accumulator: items concatenate in page order,
/// counts and capacity sum, and the cursor tracks the latest page.
pub(crate) fn merge_page(merged: &mut ResultPage, page: ResultPage) {
    merged.items.extend(page.items);
    merged.count += page.count;
    merged.scanned_count += page.scanned_count;
    merged.consumed_capacity =
        add_capacity(merged.consumed_capacity.take(), page.consumed_capacity);
    merged.last_evaluated_key = page.last_evaluated_key;
}

/// Sum two capacity reports, preserving absence when neither side reports.
pub(crate) fn add_capacity(
    left: Option<ConsumedCapacity>,
    right: Option<ConsumedCapacity>,
) -> Option<ConsumedCapacity> {
    match (left, right) {
        (None, None) => None,
        (Some(capacity), None) | (None, Some(capacity)) => Some(capacity),
        (Some(left), Some(right)) => Some(ConsumedCapacity {
            capacity_units: add_units(left.capacity_units, right.capacity_units),
            read_capacity_units: add_units(left.read_capacity_units, right.read_capacity_units),
            table_name: left.table_name.or(right.table_name),
            write_capacity_units: add_units(
                left.write_capacity_units,
                right.write_capacity_units,
            ),
        }),
    }
}

fn add_units(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (None, None) => None,
        (units, None) | (None, units) => units,
        (Some(left), Some(right)) => Some(left + right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeValue, Item};

    use std::sync::{Arc, Mutex};

    fn page(label: &str, cursor: Option<&str>) -> ResultPage {
        ResultPage {
            count: 1,
            items: vec![Item::from([(
                "id".to_string(),
                AttributeValue::S(label.to_string()),
            )])],
            last_evaluated_key: cursor.map(|cursor| {
                ItemKey::from([("id".to_string(), AttributeValue::S(cursor.to_string()))])
            }),
            scanned_count: 2,
            ..Default::default()
        }
    }

    fn scripted(
        responses: Vec<Result<ResultPage, TransportError>>,
    ) -> (
        Arc<Mutex<Vec<Option<ItemKey>>>>,
        impl FnMut(Option<ItemKey>) -> futures::future::Ready<Result<ResultPage, TransportError>>,
    ) {
        let cursors = Arc::new(Mutex::new(Vec::new()));
        let seen = cursors.clone();
        let mut responses = responses.into_iter();
        let issue = move |cursor: Option<ItemKey>| {
            seen.lock().unwrap().push(cursor);
            futures::future::ready(responses.next().expect("unexpected round trip"))
        };
        (cursors, issue)
    }

    #[tokio::test]
    async fn test_load_all_follows_cursors_and_merges() {
        let (cursors, issue) = scripted(vec![
            Ok(page("a", Some("a"))),
            Ok(page("b", Some("b"))),
            Ok(page("c", None)),
        ]);
        let merged = collect_pages(page_stream(true, issue)).await.unwrap();
        assert_eq!(merged.count, 3);
        assert_eq!(merged.scanned_count, 6);
        assert_eq!(merged.items.len(), 3);
        assert!(merged.last_evaluated_key.is_none());
        let seen = cursors.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_none());
        assert_eq!(
            seen[1],
            Some(ItemKey::from([(
                "id".to_string(),
                AttributeValue::S("a".to_string())
            )]))
        );
    }

    #[tokio::test]
    async fn test_single_page_without_load_all() {
        let (cursors, issue) = scripted(vec![Ok(page("a", Some("a")))]);
        let merged = collect_pages(page_stream(false, issue)).await.unwrap();
        assert_eq!(merged.count, 1);
        // The cursor survives so the caller can resume later.
        assert!(merged.last_evaluated_key.is_some());
        assert_eq!(cursors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_reissues_identical_request() {
        let (cursors, issue) = scripted(vec![
            Ok(page("a", Some("a"))),
            Err(TransportError::retryable("Throttled", "slow down")),
            Ok(page("b", None)),
        ]);
        let merged = collect_pages(page_stream(true, issue)).await.unwrap();
        assert_eq!(merged.count, 2);
        let seen = cursors.lock().unwrap();
        // Second and third round trips carry the same cursor: the failed
        // request was reissued, not restarted.
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], seen[2]);
    }

    #[tokio::test]
    async fn test_terminal_error_aborts() {
        let (_, issue) = scripted(vec![
            Ok(page("a", Some("a"))),
            Err(TransportError::new("AccessDenied", "no")),
        ]);
        let result = collect_pages(page_stream(true, issue)).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_add_capacity_preserves_absence() {
        assert_eq!(add_capacity(None, None), None);
        let some = ConsumedCapacity {
            capacity_units: Some(1.5),
            ..Default::default()
        };
        assert_eq!(add_capacity(Some(some.clone()), None), Some(some.clone()));
        let summed = add_capacity(Some(some.clone()), Some(some)).unwrap();
        assert_eq!(summed.capacity_units, Some(3.0));
    }
}
