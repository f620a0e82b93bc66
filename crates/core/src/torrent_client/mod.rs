//! Torrent client abstraction.
//!
//! The torrent client is the download sink: it receives a batch of magnet
//! links together with a save path. A batch is either accepted as a whole
//! or the call fails.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
