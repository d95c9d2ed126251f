use quorum_model::Table;
use serde::{Deserialize, Serialize};

use crate::{
    Store, StoreError,
    filter::Filter,
    item::{AttrPath, Item},
};

/// Position after the last evaluated item of a scan.
///
/// Opaque to callers; it can be saved and passed back to resume a scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub(crate) fn new(encoded_key: String) -> Self {
        Self(encoded_key)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameters of one scan call.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub filter: Option<Filter>,
    /// Attributes to return; `None` returns whole items.
    pub projection: Option<Vec<AttrPath>>,
    /// Maximum number of items to *evaluate* in this call. Items rejected by
    /// the filter count against it, so a page can return fewer.
    pub limit: Option<usize>,
    pub cursor: Option<Cursor>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_projection<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<AttrPath>,
    {
        self.projection = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Result of one scan call.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Set when the scan stopped before the end of the table.
    pub next_cursor: Option<Cursor>,
}

/// Evaluate one page from `entries`, which must yield `(encoded key, item)`
/// pairs in key order starting after the request cursor.
///
/// The request `limit` bounds evaluated items. `page_cap` bounds returned
/// items, so rows rejected by the filter never use up a page.
pub(crate) fn evaluate_page<I>(
    entries: I,
    request: &ScanRequest,
    page_cap: usize,
) -> Result<ScanPage, StoreError>
where
    I: Iterator<Item = Result<(String, Item), StoreError>>,
{
    let limit = request.limit.unwrap_or(usize::MAX).max(1);
    let page_cap = page_cap.max(1);
    let mut entries = entries.peekable();
    let mut items = Vec::new();
    let mut evaluated = 0;
    let mut last_key = None;

    while evaluated < limit && items.len() < page_cap {
        let Some(entry) = entries.next() else {
            break;
        };
        let (key, item) = entry?;
        evaluated += 1;

        if request.filter.as_ref().is_none_or(|f| f.matches(&item)) {
            let item = match &request.projection {
                Some(paths) => crate::item::project(&item, paths),
                None => item,
            };
            items.push(item);
        }
        last_key = Some(key);
    }

    let next_cursor = match entries.peek() {
        Some(_) => last_key.map(Cursor::new),
        None => None,
    };
    Ok(ScanPage { items, next_cursor })
}

/// Lazy sequence of scan pages.
///
/// Each [`Pages::next_page`] issues one scan call, continuing from the cursor
/// of the previous page. The sequence ends after the page without a cursor or
/// after the first error.
pub struct Pages<'a> {
    store: &'a dyn Store,
    table: Table,
    request: ScanRequest,
    fetched: usize,
    exhausted: bool,
}

impl<'a> Pages<'a> {
    pub fn new(store: &'a dyn Store, table: Table, request: ScanRequest) -> Self {
        Self {
            store,
            table,
            request,
            fetched: 0,
            exhausted: false,
        }
    }

    pub async fn next_page(&mut self) -> Option<Result<ScanPage, StoreError>> {
        if self.exhausted {
            return None;
        }

        match self.store.scan(&self.table, &self.request).await {
            Ok(page) => {
                self.fetched += 1;
                self.exhausted = page.next_cursor.is_none();
                self.request.cursor = page.next_cursor.clone();
                Some(Ok(page))
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }

    /// Cursor a new scan would resume from; `None` before the first page or
    /// once the table is exhausted.
    pub fn resume_cursor(&self) -> Option<&Cursor> {
        self.request.cursor.as_ref()
    }

    pub fn pages_fetched(&self) -> usize {
        self.fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
