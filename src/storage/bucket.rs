//! Local store contract.
//!
//! A bucket is the locally persisted collection for one entity kind (notes, tags,
//! preferences). It owns the records; the coordinator only reads them, writes
//! through the operations below, and listens for lifecycle events on the bucket's
//! [`EventSource`].

use crate::domain::error::Result;
use crate::domain::EntityId;
use crate::sync::EventSource;
use std::rc::Rc;

/// Abstraction over a local record store with change notification.
///
/// All methods take `&self`: buckets are shared between the host, which drives
/// them, and the coordinator, which reacts to them.
///
/// # Examples
///
/// ```rust
/// use notesync::domain::NoteData;
/// use notesync::storage::{Bucket, MemoryBucket};
///
/// let bucket = MemoryBucket::<NoteData>::new("note");
/// let id = bucket.add(NoteData::default())?;
/// bucket.update(&id, NoteData { content: "hi".into(), ..NoteData::default() }, false)?;
/// assert_eq!(bucket.get(&id)?.content, "hi");
/// assert_eq!(bucket.unsynced_ids(), vec![id]);
/// # Ok::<(), notesync::NotesyncError>(())
/// ```
pub trait Bucket {
    /// Record payload stored under each id.
    type Record: Clone;

    /// Event source publishing this bucket's `index`, `update`, `remove` and
    /// before-network-change events.
    fn events(&self) -> Rc<dyn EventSource>;

    /// Fetches the authoritative stored record.
    ///
    /// # Errors
    ///
    /// Returns [`NotesyncError::NotFound`](crate::NotesyncError::NotFound) for
    /// unknown ids, or a storage error if the read fails.
    fn get(&self, id: &str) -> Result<Self::Record>;

    /// Returns every record with its id, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn all(&self) -> Result<Vec<(EntityId, Self::Record)>>;

    /// Stores a new record under a freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn add(&self, record: Self::Record) -> Result<EntityId>;

    /// Replaces a record. With `sync`, the change is pushed right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update(&self, id: &str, record: Self::Record, sync: bool) -> Result<()>;

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`NotesyncError::NotFound`](crate::NotesyncError::NotFound) for
    /// unknown ids.
    fn remove(&self, id: &str) -> Result<()>;

    /// Asks the bucket to push a record that is still waiting to sync.
    ///
    /// # Errors
    ///
    /// Returns [`NotesyncError::NotFound`](crate::NotesyncError::NotFound) for
    /// unknown ids.
    fn touch(&self, id: &str) -> Result<()>;

    /// Ids of records with local changes the server has not acknowledged.
    fn unsynced_ids(&self) -> Vec<EntityId>;
}
