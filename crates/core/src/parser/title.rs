//! Episode number extraction from free-text release titles.
//!
//! Heuristics, first match wins:
//! 1. A movie marker or a `[BD]` batch marker yields episode 1.
//! 2. `S<season>E<episode>` yields `<episode>`.
//! 3. `" - <number>"` yields `<number>`.
//!
//! When the number from rule 2 or 3 equals the quality tag read as an
//! integer (e.g. `Show - 1080 [x265]`), the result is episode 1.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"S\d+E(\d+)").expect("valid season/episode pattern"));

static HYPHEN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" - (\d+)").expect("valid hyphen pattern"));

static BD_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[BD\]").expect("valid BD pattern"));

static MOVIE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)movie").expect("valid movie pattern"));

/// Extract an episode number from a release title.
///
/// Returns `None` when no heuristic matches, or when the captured number is
/// zero or does not fit in a `u32`.
pub fn parse_episode_number(title: &str, quality_tag: &str) -> Option<u32> {
    if MOVIE_MARKER.is_match(title) || BD_MARKER.is_match(title) {
        return Some(1);
    }

    let captured = SEASON_EPISODE
        .captures(title)
        .or_else(|| HYPHEN_NUMBER.captures(title))?;
    let episode: u32 = captured.get(1)?.as_str().parse().ok()?;

    if quality_tag.trim().parse::<u32>().ok() == Some(episode) {
        return Some(1);
    }

    (episode > 0).then_some(episode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hyphen_episode() {
        assert_eq!(
            parse_episode_number("[SubsPlease] Sousou no Frieren - 07 (1080p) [ABCD1234].mkv", "1080"),
            Some(7)
        );
    }

    #[test]
    fn test_season_episode() {
        assert_eq!(
            parse_episode_number("Frieren S01E14 1080p WEB H264-VARYG", "1080"),
            Some(14)
        );
    }

    #[test]
    fn test_season_episode_wins_over_hyphen() {
        assert_eq!(
            parse_episode_number("Show - 03 S02E05 1080p", "1080"),
            Some(5)
        );
    }

    #[test]
    fn test_movie_marker_is_case_insensitive() {
        assert_eq!(
            parse_episode_number("[Group] Show The MOVIE - 2 (1080p)", "1080"),
            Some(1)
        );
    }

    #[test]
    fn test_bd_batch_marker() {
        assert_eq!(
            parse_episode_number("[Group] Show [bd] [1080p] - 12", "1080"),
            Some(1)
        );
    }

    #[test]
    fn test_bd_without_brackets_is_not_a_marker() {
        assert_eq!(parse_episode_number("Show BD - 04 1080", "1080"), Some(4));
    }

    #[test]
    fn test_quality_collision_normalizes_to_one() {
        assert_eq!(parse_episode_number("Show - 1080 [x265]", "1080"), Some(1));
        assert_eq!(parse_episode_number("Show S01E720 720p", "720"), Some(1));
    }

    #[test]
    fn test_non_numeric_quality_disables_normalization() {
        assert_eq!(parse_episode_number("Show - 1080", "1080p"), Some(1080));
    }

    #[test]
    fn test_no_episode_number() {
        assert_eq!(parse_episode_number("Show Complete Batch 1080p", "1080"), None);
        assert_eq!(parse_episode_number("Show-05 1080p", "1080"), None);
        assert_eq!(parse_episode_number("", "1080"), None);
    }

    #[test]
    fn test_episode_zero_is_absent() {
        assert_eq!(parse_episode_number("Show - 00 (1080p)", "1080"), None);
    }

    #[test]
    fn test_overflowing_number_is_absent() {
        assert_eq!(
            parse_episode_number("Show - 99999999999999 (1080p)", "1080"),
            None
        );
    }

    proptest! {
        #[test]
        fn prop_season_episode_equal_to_quality_is_one(
            season in 1u32..100,
            quality in 1u32..5000,
            prefix in "[A-Za-z ]{0,20}",
        ) {
            prop_assume!(!prefix.to_lowercase().contains("movie"));
            let title = format!("{}S{:02}E{} x264", prefix, season, quality);
            prop_assert_eq!(parse_episode_number(&title, &quality.to_string()), Some(1));
        }

        #[test]
        fn prop_markers_always_yield_one(
            episode in 0u32..5000,
            marker in prop_oneof![Just("Movie"), Just("movie"), Just("[BD]"), Just("[Bd]")],
        ) {
            let title = format!("[Group] Show {} - {} S01E{} (1080p)", marker, episode, episode);
            prop_assert_eq!(parse_episode_number(&title, "1080"), Some(1));
        }
    }
}
