//! Data model shared by the quorum crates.
//!
//! Every record here is stored as a JSON object with camelCase field names.
//! The same names are used on the wire, so a record deserialized from the
//! store can be handed to a labeler and read back from their answer unchanged.

mod domain;
pub use domain::*;

mod record;
pub use record::*;
