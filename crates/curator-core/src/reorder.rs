//! Drag-and-drop reordering.
//!
//! A [`ReorderCoordinator`] holds the sequence currently on screen. A drag
//! starts at one index and drops at another; the coordinator moves the
//! element, updates its own order immediately and then writes the new
//! positions of the records that actually moved.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use crate::error::{Error, InvalidInputError};
use crate::record::{ContentRecord, StatusFilter};
use crate::traits::Repository;
use crate::types::RecordKey;
use crate::view;
use crate::Result;

/// Move the element at `from` so it ends up at `to`.
///
/// Elements between the two indexes shift by one; everything else stays.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(reorder_error(format!(
            "cannot move {from} to {to} in a list of {len}"
        )));
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

fn reorder_error(reason: String) -> Error {
    Error::InvalidInput(InvalidInputError::Reorder { reason })
}

/// Whether a drag is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderState {
    Idle,
    Reordering { source: usize },
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Dropped in place or outside the list. Nothing was written.
    Unchanged,
    /// The order changed and `persisted` position updates were written.
    Moved { order: Vec<RecordKey>, persisted: usize },
}

#[derive(Debug, Clone)]
struct Entry {
    key: RecordKey,
    position: Option<u32>,
}

#[derive(Debug)]
struct Board {
    entries: Vec<Entry>,
    state: ReorderState,
}

/// Coordinates reordering of one displayed collection.
pub struct ReorderCoordinator<R: Repository + ?Sized> {
    repo: Arc<R>,
    board: Mutex<Board>,
    // Held for the whole of a drop so persistence happens in drop order.
    persist: tokio::sync::Mutex<()>,
}

impl<R: Repository + ?Sized> ReorderCoordinator<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            board: Mutex::new(Board {
                entries: Vec::new(),
                state: ReorderState::Idle,
            }),
            persist: tokio::sync::Mutex::new(()),
        }
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the displayed sequence, in display order. Resets to idle.
    pub fn load<'a, I>(&self, records: I)
    where
        I: IntoIterator<Item = &'a ContentRecord>,
    {
        let mut board = self.board();
        board.entries = records
            .into_iter()
            .map(|r| Entry {
                key: r.key.clone(),
                position: r.position,
            })
            .collect();
        board.state = ReorderState::Idle;
    }

    /// Load `records` as the ordered view for `filter` would show them.
    pub fn load_view(&self, records: &[ContentRecord], filter: StatusFilter) {
        self.load(view::ordered(records, filter));
    }

    /// Fetch the collection and load its ordered view.
    pub async fn refresh(&self, filter: StatusFilter) -> Result<()> {
        let records = self.repo.get_all(filter).await?;
        self.load_view(&records, filter);
        Ok(())
    }

    /// Keys in current display order.
    pub fn order(&self) -> Vec<RecordKey> {
        self.board().entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn state(&self) -> ReorderState {
        self.board().state
    }

    pub fn len(&self) -> usize {
        self.board().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Begin dragging the row at `source`.
    pub fn drag_start(&self, source: usize) -> Result<()> {
        let mut board = self.board();
        if source >= board.entries.len() {
            return Err(reorder_error(format!(
                "drag source {source} is outside a list of {}",
                board.entries.len()
            )));
        }
        board.state = ReorderState::Reordering { source };
        Ok(())
    }

    /// Abandon the current drag.
    pub fn cancel(&self) {
        self.board().state = ReorderState::Idle;
    }

    /// Finish the current drag at `destination`.
    ///
    /// The in-memory order changes before anything is written. If writing
    /// fails the new order is kept and [`Error::ReorderPersistFailed`] is
    /// returned so the caller can refresh.
    #[instrument(skip(self), fields(collection = %self.repo.collection()))]
    pub async fn drop(&self, destination: Option<usize>) -> Result<ReorderOutcome> {
        let _queue = self.persist.lock().await;

        let (order, updates) = {
            let mut board = self.board();
            let source = match board.state {
                ReorderState::Reordering { source } => source,
                ReorderState::Idle => {
                    return Err(reorder_error("drop without a drag in progress".to_string()));
                }
            };
            board.state = ReorderState::Idle;

            let Some(destination) = destination else {
                debug!(source, "dropped outside the list");
                return Ok(ReorderOutcome::Unchanged);
            };
            if source == destination {
                return Ok(ReorderOutcome::Unchanged);
            }

            move_item(&mut board.entries, source, destination)?;

            // Entry positions track what is stored, not what is shown.
            let updates: Vec<(RecordKey, u32)> = board
                .entries
                .iter()
                .enumerate()
                .filter_map(|(idx, entry)| {
                    let position = idx as u32 + 1;
                    (entry.position != Some(position)).then(|| (entry.key.clone(), position))
                })
                .collect();
            let order: Vec<RecordKey> = board.entries.iter().map(|e| e.key.clone()).collect();
            (order, updates)
        };

        let total = updates.len();
        debug!(total, "persisting positions");
        match self.repo.reposition(&updates).await {
            Ok(()) => {
                self.record_stored(&updates, total);
                Ok(ReorderOutcome::Moved {
                    order,
                    persisted: total,
                })
            }
            Err(err) => {
                warn!(error = %err, "reorder not fully persisted; displayed order kept");
                let err = match err {
                    Error::ReorderPersistFailed { .. } => err,
                    other => Error::ReorderPersistFailed {
                        persisted: 0,
                        total,
                        source: Box::new(other),
                    },
                };
                if let Error::ReorderPersistFailed { persisted, .. } = &err {
                    self.record_stored(&updates, *persisted);
                }
                Err(err)
            }
        }
    }

    /// Note the first `persisted` updates as stored. The stored position of
    /// the rest is unknown, so the next drop rewrites them.
    fn record_stored(&self, updates: &[(RecordKey, u32)], persisted: usize) {
        let mut board = self.board();
        for (idx, (key, position)) in updates.iter().enumerate() {
            if let Some(entry) = board.entries.iter_mut().find(|e| &e.key == key) {
                entry.position = (idx < persisted).then_some(*position);
            }
        }
    }

    /// Drag from `source` and drop at `destination`.
    pub async fn reorder(&self, source: usize, destination: usize) -> Result<ReorderOutcome> {
        self.drag_start(source)?;
        self.drop(Some(destination)).await
    }
}
