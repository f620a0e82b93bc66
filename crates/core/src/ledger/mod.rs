//! Episode ledger: which episodes of which series were already handed to
//! the torrent client.
//!
//! The ledger is the only durable state. `JsonLedger` keeps it as a single
//! JSON object rewritten in full on every mutation, so writers must be
//! serialized by the caller (see `dispatch::DispatchCoordinator`).

mod json;
mod memory;
mod types;

pub use json::JsonLedger;
pub use memory::MemoryLedger;
pub use types::*;
