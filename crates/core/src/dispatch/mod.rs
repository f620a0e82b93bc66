//! Dispatch coordinator.
//!
//! Runs one discovery cycle at a time across the whole process:
//! discovery, hand-off to the torrent client and ledger updates all happen
//! under a single lock, because the ledger is rewritten in full on every
//! mutation.

mod coordinator;
mod types;

pub use coordinator::{DispatchCoordinator, DispatchSettings};
pub use types::{CycleOutcome, DispatchError};
