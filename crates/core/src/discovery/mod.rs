//! Episode discovery: provider rows in, new episode candidates out.

mod engine;

pub use engine::{select_candidates, DiscoveryEngine, EpisodeCandidate};
