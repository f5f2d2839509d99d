// ── Paginated enumerator ──
//
// Turns a page-at-a-time listing into a complete, ordered Vec. Stops on
// an absent cursor, never on an empty page. A cursor seen twice, or more
// than a fixed number of pages, ends the walk with an error.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::remote::{Page, PageCursor};

/// Upper bound on pages fetched by one enumeration.
pub const DEFAULT_MAX_PAGES: usize = 1_000;

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    limit: u32,
    max_pages: usize,
}

impl Paginator {
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch pages until the cursor runs out, concatenating in page order.
    ///
    /// The first error is returned unchanged and partial results are dropped.
    pub async fn collect<T, F, Fut>(&self, fetch: F) -> Result<Vec<T>, CoreError>
    where
        F: FnMut(PageCursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, CoreError>>,
    {
        let mut all = Vec::new();
        self.walk(fetch, |items| {
            all.extend(items);
            None::<()>
        })
        .await?;
        Ok(all)
    }

    /// Fetch pages until an item satisfies `pred`; later pages are not
    /// requested.
    pub async fn find<T, F, Fut>(
        &self,
        fetch: F,
        mut pred: impl FnMut(&T) -> bool,
    ) -> Result<Option<T>, CoreError>
    where
        F: FnMut(PageCursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, CoreError>>,
    {
        self.walk(fetch, |items: Vec<T>| items.into_iter().find(|item| pred(item)))
            .await
    }

    /// Hands each page to `visit` until it returns `Some` or the cursor
    /// runs out. Any cursor seen before is an error.
    async fn walk<T, B, F, Fut>(
        &self,
        mut fetch: F,
        mut visit: impl FnMut(Vec<T>) -> Option<B>,
    ) -> Result<Option<B>, CoreError>
    where
        F: FnMut(PageCursor) -> Fut,
        Fut: Future<Output = Result<Page<T>, CoreError>>,
    {
        let mut cursor = PageCursor::Start { limit: self.limit };
        let mut seen: HashSet<String> = HashSet::new();

        for page_number in 1..=self.max_pages {
            let page = fetch(cursor).await?;
            let next = page.next.filter(|n| !n.is_empty());

            if page.items.is_empty() && next.is_some() {
                warn!(page = page_number, "empty page with a continuation cursor");
            }
            if let Some(found) = visit(page.items) {
                debug!(pages = page_number, "match found, pagination stopped");
                return Ok(Some(found));
            }

            let Some(next) = next else {
                debug!(pages = page_number, "pagination complete");
                return Ok(None);
            };

            if !seen.insert(next.clone()) {
                return Err(CoreError::Pagination {
                    reason: format!("cursor {next:?} repeated after page {page_number}"),
                });
            }
            cursor = PageCursor::Next(next);
        }

        Err(CoreError::Pagination {
            reason: format!("more than {} pages", self.max_pages),
        })
    }
}
