//! Release title parsing.

mod title;

pub use title::parse_episode_number;
