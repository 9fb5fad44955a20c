//! Reconciliation between local records and their remote counterparts.
//!
//! `serialize`/`deserialize` translate between a [`sfb_core::Record`]
//! and the remote field-name/JSON payload its schema describes. The
//! [`Syncer`] drives push, pull and bulk pull over a store and a
//! connection, keeping the `sync_at`/`modify_at` bookkeeping honest.

mod deserialize;
mod engine;
mod serialize;

pub use deserialize::deserialize;
pub use engine::{PullAllReport, PushOutcome, Syncer};
pub use serialize::{apply_update_fields, serialize, SerializeOptions};

#[cfg(test)]
pub(crate) mod test_helpers;
