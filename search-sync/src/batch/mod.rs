//! Bounded-memory iteration over the objects of a data source.

use std::collections::VecDeque;
use std::sync::Arc;

use search_sync_shared::DataObject;
use tracing::debug;

use crate::errors::FetchError;
use crate::source::DataSource;

/// One fetched slice of the id list.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// The requested ids, in list order.
    pub ids: Vec<String>,
    /// The objects the data source returned for `ids`.
    pub objects: Vec<DataObject>,
}

/// Lazy, finite, non-restartable sequence of data objects.
///
/// Walks an ordered id list with a cursor and fetches `batch_size` ids at a time,
/// so at most one slice of objects is resident. Each id is requested exactly once.
/// Ids the data source does not return are dropped.
pub struct BatchIterator {
    source: Arc<dyn DataSource>,
    ids: Vec<String>,
    batch_size: usize,
    cursor: usize,
    current_ids: Vec<String>,
    buffer: VecDeque<DataObject>,
}

impl BatchIterator {
    /// Create an iterator. A `batch_size` of 0 is treated as 1.
    pub fn new(source: Arc<dyn DataSource>, ids: Vec<String>, batch_size: usize) -> Self {
        Self {
            source,
            ids,
            batch_size: batch_size.max(1),
            cursor: 0,
            current_ids: Vec::new(),
            buffer: VecDeque::new(),
        }
    }

    /// Next object, fetching the next slice when the buffer is empty.
    pub async fn next(&mut self) -> Result<Option<DataObject>, FetchError> {
        loop {
            if let Some(object) = self.buffer.pop_front() {
                return Ok(Some(object));
            }
            if !self.refill().await? {
                return Ok(None);
            }
        }
    }

    /// Remaining objects of the current slice, or the next slice.
    ///
    /// A page may hold no objects when the data source returned none of its ids.
    /// Returns `None` once the id list is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Page>, FetchError> {
        if self.buffer.is_empty() && !self.refill().await? {
            return Ok(None);
        }

        Ok(Some(Page {
            ids: std::mem::take(&mut self.current_ids),
            objects: self.buffer.drain(..).collect(),
        }))
    }

    /// Number of ids not yet requested.
    pub fn remaining_ids(&self) -> usize {
        self.ids.len() - self.cursor
    }

    /// Fetch the next slice into the buffer. Returns false when no ids remain.
    async fn refill(&mut self) -> Result<bool, FetchError> {
        if self.cursor >= self.ids.len() {
            return Ok(false);
        }

        let end = (self.cursor + self.batch_size).min(self.ids.len());
        let slice = self.ids[self.cursor..end].to_vec();
        self.cursor = end;

        let objects = self.source.fetch_objects(&slice).await?;
        debug!(
            data_source_id = %self.source.id(),
            requested = slice.len(),
            fetched = objects.len(),
            remaining = self.remaining_ids(),
            "Fetched batch"
        );

        self.current_ids = slice;
        self.buffer.extend(objects);
        Ok(true)
    }
}
