// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Cursor-based pagination over provider list APIs.
//!
//! Providers disagree on how "give me the next page" is spelled: some hand
//! back an opaque token, some a fully-formed next-page URL, some expect the
//! caller to track a numeric offset. [`PageMarker`] unifies the three,
//! [`PaginatedCollection`] is one page of results plus the marker for the
//! next one, and [`Pager`] walks markers until a provider reports the last
//! page.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};
use url::Url;

use crate::api::error::{ApiError, ApiResult};

/// Hard ceiling on pages walked by a single [`Pager`]. A provider that hands
/// out more markers than this is looping.
const MAX_PAGES: usize = 10_000;

/// Position of the next page in a provider listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMarker {
    /// Opaque continuation token, usually the id of the last item seen.
    Token(String),
    /// Absolute URL of the next page.
    Link(Url),
    /// Numeric offset of the first item of the next page.
    Offset(u64),
}

impl PageMarker {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            PageMarker::Token(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Url> {
        match self {
            PageMarker::Link(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_offset(&self) -> Option<u64> {
        match self {
            PageMarker::Offset(o) => Some(*o),
            _ => None,
        }
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMarker::Token(t) => write!(f, "token:{}", t),
            PageMarker::Link(u) => write!(f, "link:{}", u),
            PageMarker::Offset(o) => write!(f, "offset:{}", o),
        }
    }
}

/// One page of a provider listing.
///
/// Carries the items of the page and, unless this is the last page, the
/// marker that fetches the next one. An empty page with a marker is legal;
/// some providers emit them mid-listing and iteration must keep going.
#[derive(Debug, Clone)]
pub struct PaginatedCollection<T> {
    items: Vec<T>,
    next_marker: Option<PageMarker>,
}

impl<T> PaginatedCollection<T> {
    /// A page followed by more pages when `next_marker` is `Some`.
    pub fn new(items: Vec<T>, next_marker: Option<PageMarker>) -> Self {
        Self { items, next_marker }
    }

    /// The last page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_marker: None,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_marker(&self) -> Option<&PageMarker> {
        self.next_marker.as_ref()
    }

    /// Whether the provider reported this as the final page.
    pub fn is_last(&self) -> bool {
        self.next_marker.is_none()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<PageMarker>) {
        (self.items, self.next_marker)
    }

    /// Map the page's items, keeping the marker. This is how provider
    /// adapters turn a page of wire structs into a page of the generic
    /// model without disturbing pagination.
    pub fn map<U, F>(self, f: F) -> PaginatedCollection<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedCollection {
            items: self.items.into_iter().map(f).collect(),
            next_marker: self.next_marker,
        }
    }
}

impl<T> IntoIterator for PaginatedCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PaginatedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Lazy page walker over a marker-paginated listing.
///
/// The fetch closure receives `None` for the first page and the previous
/// page's marker afterwards. The pager stops when a page carries no marker,
/// when the provider repeats a marker verbatim (some APIs echo the request
/// marker back on the last page instead of omitting it), or after
/// [`MAX_PAGES`] pages.
///
/// A fetch error is returned once and ends the iteration; a pager is not
/// resumable past a failed page.
pub struct Pager<T, F> {
    fetch: F,
    cursor: Option<PageMarker>,
    started: bool,
    done: bool,
    pages_fetched: usize,
    what: &'static str,
    _items: PhantomData<fn() -> T>,
}

impl<T, F, Fut> Pager<T, F>
where
    F: FnMut(Option<PageMarker>) -> Fut,
    Fut: Future<Output = ApiResult<PaginatedCollection<T>>>,
{
    /// Create a pager over `fetch`. `what` names the listing in logs,
    /// e.g. `"servers"`.
    pub fn new(what: &'static str, fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            started: false,
            done: false,
            pages_fetched: 0,
            what,
            _items: PhantomData,
        }
    }

    /// Fetch the next page, or `Ok(None)` once the listing is exhausted.
    pub async fn next_page(&mut self) -> ApiResult<Option<PaginatedCollection<T>>> {
        if self.done {
            return Ok(None);
        }
        if self.started && self.cursor.is_none() {
            self.done = true;
            return Ok(None);
        }
        if self.pages_fetched >= MAX_PAGES {
            self.done = true;
            return Err(ApiError::PaginationError(format!(
                "{} listing exceeded {} pages, marker chain is looping",
                self.what, MAX_PAGES
            )));
        }

        let request_marker = self.cursor.clone();
        let page = match (self.fetch)(request_marker.clone()).await {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        self.started = true;
        self.pages_fetched += 1;
        debug!(
            "fetched page {} of {} ({} items, last={})",
            self.pages_fetched,
            self.what,
            page.len(),
            page.is_last()
        );

        match (&request_marker, page.next_marker()) {
            (Some(prev), Some(next)) if prev == next => {
                // Marker did not advance; treat this as the final page
                // rather than refetching it forever.
                warn!(
                    "{} listing repeated marker {}, stopping pagination",
                    self.what, next
                );
                self.cursor = None;
            }
            (_, next) => self.cursor = next.cloned(),
        }

        Ok(Some(page))
    }

    /// Drain every remaining page into one vector. Convenient for catalogs
    /// known to be small (hardware profiles, locations).
    pub async fn collect_all(mut self) -> ApiResult<Vec<T>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    /// Turn the pager into a stream of items, fetching pages on demand.
    /// A fetch error is yielded as the final stream element.
    pub fn into_stream(self) -> impl Stream<Item = ApiResult<T>> {
        stream::unfold(Some(self), |state| async move {
            let mut pager = state?;
            match pager.next_page().await {
                Ok(Some(page)) => {
                    let items: Vec<ApiResult<T>> = page.into_iter().map(Ok).collect();
                    Some((stream::iter(items), Some(pager)))
                }
                Ok(None) => None,
                Err(e) => Some((stream::iter(vec![Err(e)]), None)),
            }
        })
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_marker_accessors() {
        let token = PageMarker::Token("srv-9".to_string());
        assert_eq!(token.as_token(), Some("srv-9"));
        assert_eq!(token.as_offset(), None);
        assert_eq!(token.to_string(), "token:srv-9");

        let offset = PageMarker::Offset(200);
        assert_eq!(offset.as_offset(), Some(200));
        assert_eq!(offset.as_token(), None);
        assert_eq!(offset.to_string(), "offset:200");

        let url = Url::parse("https://api.example.com/v2/servers?marker=srv-9").unwrap();
        let link = PageMarker::Link(url.clone());
        assert_eq!(link.as_link(), Some(&url));
        assert_eq!(link.as_offset(), None);
    }

    #[test]
    fn test_collection_basics() {
        let page = PaginatedCollection::new(vec![1, 2, 3], Some(PageMarker::Offset(3)));
        assert_eq!(page.len(), 3);
        assert!(!page.is_empty());
        assert!(!page.is_last());
        assert_eq!(page.items(), &[1, 2, 3]);
        assert_eq!(page.next_marker(), Some(&PageMarker::Offset(3)));

        let last = PaginatedCollection::last(vec![4]);
        assert!(last.is_last());
        assert_eq!(last.len(), 1);

        let empty: PaginatedCollection<i32> = PaginatedCollection::last(vec![]);
        assert!(empty.is_empty());
        assert!(empty.is_last());
    }

    #[test]
    fn test_collection_into_parts_and_iter() {
        let page = PaginatedCollection::new(vec![10, 20], Some(PageMarker::Token("x".into())));
        let borrowed: Vec<i32> = (&page).into_iter().copied().collect();
        assert_eq!(borrowed, vec![10, 20]);

        let (items, marker) = page.into_parts();
        assert_eq!(items, vec![10, 20]);
        assert_eq!(marker, Some(PageMarker::Token("x".to_string())));
    }

    #[test]
    fn test_collection_map_keeps_marker() {
        let page = PaginatedCollection::new(vec![1, 2], Some(PageMarker::Offset(2)));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items(), &[10, 20]);
        assert_eq!(mapped.next_marker(), Some(&PageMarker::Offset(2)));
    }

    #[tokio::test]
    async fn test_pager_walks_all_pages_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let pager = Pager::new("items", move |marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                match call {
                    0 => {
                        assert!(marker.is_none());
                        Ok(PaginatedCollection::new(
                            vec![1, 2],
                            Some(PageMarker::Token("a".to_string())),
                        ))
                    }
                    1 => {
                        assert_eq!(marker, Some(PageMarker::Token("a".to_string())));
                        Ok(PaginatedCollection::new(
                            vec![3],
                            Some(PageMarker::Token("b".to_string())),
                        ))
                    }
                    2 => {
                        assert_eq!(marker, Some(PageMarker::Token("b".to_string())));
                        Ok(PaginatedCollection::last(vec![4, 5]))
                    }
                    _ => panic!("fetched past the last page"),
                }
            }
        });

        let all = pager.collect_all().await.unwrap();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pager_next_page_stops_cleanly() {
        let mut pager = Pager::new("items", move |_marker| async move {
            Ok(PaginatedCollection::last(vec![1]))
        });

        let first = pager.next_page().await.unwrap();
        assert_eq!(first.unwrap().items(), &[1]);
        assert!(pager.next_page().await.unwrap().is_none());
        // Stays exhausted on repeated calls
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pager_continues_through_empty_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(PaginatedCollection::new(
                        vec![1],
                        Some(PageMarker::Offset(1)),
                    )),
                    // Empty but marked page must not end the listing
                    1 => Ok(PaginatedCollection::new(
                        vec![],
                        Some(PageMarker::Offset(1000)),
                    )),
                    _ => Ok(PaginatedCollection::last(vec![2])),
                }
            }
        });

        let all = pager.collect_all().await.unwrap();
        assert_eq!(all, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pager_stops_on_repeated_marker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        // A provider that echoes the request marker back forever.
        let pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(PaginatedCollection::new(
                    vec![7],
                    Some(PageMarker::Token("stuck".to_string())),
                ))
            }
        });

        let all = pager.collect_all().await.unwrap();
        // First page (None -> "stuck") advances, second repeats and stops.
        assert_eq!(all, vec![7, 7]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pager_error_ends_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(PaginatedCollection::new(
                        vec![1],
                        Some(PageMarker::Token("a".to_string())),
                    )),
                    _ => Err(ApiError::StatusError {
                        status: 500,
                        message: "boom".to_string(),
                    }),
                }
            }
        });

        assert!(pager.next_page().await.unwrap().is_some());
        assert!(pager.next_page().await.is_err());
        // The error consumed the pager
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pager_page_ceiling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        // Markers always advance, so only the ceiling can stop this one.
        let pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(PaginatedCollection::new(
                    vec![n],
                    Some(PageMarker::Offset(n as u64 + 1)),
                ))
            }
        });

        let err = pager.collect_all().await.unwrap_err();
        match err {
            ApiError::PaginationError(msg) => assert!(msg.contains("looping")),
            other => panic!("expected PaginationError, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), MAX_PAGES);
    }

    #[tokio::test]
    async fn test_into_stream_yields_items_across_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(PaginatedCollection::new(
                        vec!["a", "b"],
                        Some(PageMarker::Offset(2)),
                    )),
                    _ => Ok(PaginatedCollection::last(vec!["c"])),
                }
            }
        });

        let stream = pager.into_stream();
        futures::pin_mut!(stream);

        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_into_stream_surfaces_error_and_ends() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let pager = Pager::new("items", move |_marker| {
            let calls = Arc::clone(&calls_clone);
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(PaginatedCollection::new(
                        vec![1],
                        Some(PageMarker::Offset(1)),
                    )),
                    _ => Err(ApiError::StatusError {
                        status: 502,
                        message: "bad gateway".to_string(),
                    }),
                }
            }
        });

        let stream = pager.into_stream();
        futures::pin_mut!(stream);

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(stream.next().await.is_none());
    }
}
