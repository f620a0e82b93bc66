//! Torrent index providers.
//!
//! A `Provider` turns a series name (optionally scoped to one episode) into
//! the raw rows of the index's result table. Providers never fail loudly:
//! network problems are logged and produce an empty result so a single
//! outage cannot stop the scheduler.

mod nyaa;
mod types;

pub use nyaa::{parse_results, NyaaProvider};
pub use types::*;
