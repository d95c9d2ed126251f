//! Storage accessor for the labeling tables.
//!
//! The [`Store`] trait is the whole contract the rest of the system relies on:
//! point get/put/delete, conditional update, and filtered scans with a
//! continuation cursor. Filters, conditions and updates are typed values
//! ([`Filter`], [`Update`]) rather than expression strings.

mod error;
pub use error::StoreError;

mod item;
pub use item::{AttrPath, Item, Key, from_item, to_item};

mod filter;
pub use filter::{CmpOp, Filter};

mod update;
pub use update::{Update, UpdateAction};

mod scan;
pub use scan::{Cursor, Pages, ScanPage, ScanRequest};

mod traits;
pub use traits::Store;

mod memory;
pub use memory::{DEFAULT_PAGE_CAP, MemoryStore};

#[cfg(feature = "redb")]
mod redb;
#[cfg(feature = "redb")]
pub use crate::redb::RedbStore;

mod seed;
pub use seed::SeedLoader;
