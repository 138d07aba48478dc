//! Configuration for matching and polling, plus the screen layout constants
//! of the card game the bot drives

use super::match_image::Region;
use std::time::Duration;

pub const DEFAULT_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Similarity a match must strictly exceed (0.0 to 1.0)
    pub threshold: f64,
    /// Failed locate attempts before a poll gives up
    pub max_attempts: u32,
    /// Wait between unsuccessful poll iterations
    pub backoff: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl MatchConfig {
    /// Preset for small UI elements that are easily confused (icons, badges)
    pub fn strict() -> Self {
        Self {
            threshold: 0.9,
            ..Self::default()
        }
    }

    /// Preset for screens that take long to appear (loading, matchmaking)
    pub fn patient() -> Self {
        Self {
            max_attempts: 240,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Attempt ceilings are positive; 0 is raised to 1
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Zoomed card view shown while a card is long-pressed (900x1600 screen)
pub const ZOOM_CARD_REGION: Region = Region::new(80, 255, 740, 1020);
/// Counter showing how many cards are in hand
pub const NUMBER_OF_CARDS_REGION: Region = Region::new(790, 1325, 60, 50);
/// Bench slots, left to right
pub const BENCH_POSITIONS: [(u32, u32); 3] = [(230, 1220), (460, 1220), (700, 1220)];
/// Neutral point tapped to dismiss overlays
pub const RESET_POINT: (u32, u32) = (0, 1350);
/// Horizontal pixel spacing between hand cards, keyed by hand size
pub const CARD_OFFSETS: [(u32, u32); 7] =
    [(2, 92), (3, 92), (4, 78), (5, 65), (6, 55), (7, 47), (8, 45)];

/// Caller-supplied screen coordinates used by the capture helpers
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub zoom_card_region: Region,
    pub number_of_cards_region: Region,
    pub bench_positions: Vec<(u32, u32)>,
    pub card_offsets: Vec<(u32, u32)>,
    pub reset_point: (u32, u32),
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            zoom_card_region: ZOOM_CARD_REGION,
            number_of_cards_region: NUMBER_OF_CARDS_REGION,
            bench_positions: BENCH_POSITIONS.to_vec(),
            card_offsets: CARD_OFFSETS.to_vec(),
            reset_point: RESET_POINT,
        }
    }
}

impl CardLayout {
    /// Bench slot by zero-based index
    pub fn bench_position(&self, slot: usize) -> Option<(u32, u32)> {
        self.bench_positions.get(slot).copied()
    }

    /// Spacing between cards for a hand of `count` cards; a single card has none
    pub fn card_offset(&self, count: u32) -> Option<u32> {
        self.card_offsets
            .iter()
            .find(|(hand, _)| *hand == count)
            .map(|(_, offset)| *offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_config_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.max_attempts, 50);
        assert_eq!(config.backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_match_config_builders() {
        let config = MatchConfig::strict()
            .with_max_attempts(0)
            .with_threshold(1.7)
            .with_backoff(Duration::from_millis(250));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.backoff, Duration::from_millis(250));
        assert_eq!(MatchConfig::patient().threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_card_layout_bench_slots() {
        let layout = CardLayout::default();
        assert_eq!(layout.bench_position(0), Some((230, 1220)));
        assert_eq!(layout.bench_position(2), Some((700, 1220)));
        assert_eq!(layout.bench_position(3), None);
        assert_eq!(layout.zoom_card_region, Region::new(80, 255, 740, 1020));
    }

    #[test]
    fn test_card_offset_by_hand_size() {
        let layout = CardLayout::default();
        assert_eq!(layout.card_offset(4), Some(78));
        assert_eq!(layout.card_offset(8), Some(45));
        assert_eq!(layout.card_offset(1), None);
        assert_eq!(layout.card_offset(9), None);
    }
}
