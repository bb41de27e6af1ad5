//! Cache key conventions.
//!
//! Keys are colon-delimited hierarchies so that related entries can be dropped
//! together with a single pattern, e.g. every admin event list with
//! [`EVENT_LISTS_PATTERN`]. The coordinator itself treats keys as opaque.

use std::fmt::Display;

/// TTL for leaderboards, which change with every submitted answer.
pub const LEADERBOARD_TTL: u64 = 30;
/// TTL for participant credential lookups.
pub const CREDENTIALS_TTL: u64 = 120;
/// TTL for question sets of a round.
pub const QUESTION_SET_TTL: u64 = 300;
/// TTL for event listings.
pub const EVENT_LIST_TTL: u64 = 600;
/// TTL for near-static event metadata.
pub const EVENT_TTL: u64 = 1800;

/// Matches every cached event listing.
pub const EVENT_LISTS_PATTERN: &str = "events:list*";
/// Matches every cached leaderboard.
pub const LEADERBOARDS_PATTERN: &str = "leaderboard:*";

pub fn event(id: impl Display) -> String {
    format!("event:{id}")
}

/// Public listing of all events.
pub fn events_list() -> String {
    "events:list".to_string()
}

/// Listing of events visible to one admin.
pub fn events_list_admin(admin_id: impl Display) -> String {
    format!("events:list:admin:{admin_id}")
}

pub fn round_leaderboard(round_id: impl Display) -> String {
    format!("leaderboard:round:{round_id}")
}

pub fn event_leaderboard(event_id: impl Display) -> String {
    format!("leaderboard:event:{event_id}")
}

pub fn round_questions(round_id: impl Display) -> String {
    format!("questions:round:{round_id}")
}

pub fn participant_credentials(participant_id: impl Display) -> String {
    format!("participant:credentials:{participant_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GlobPattern;

    #[test]
    fn test_key_shapes() {
        assert_eq!(event(12), "event:12");
        assert_eq!(events_list_admin("u7"), "events:list:admin:u7");
        assert_eq!(round_leaderboard(3), "leaderboard:round:3");
        assert_eq!(round_questions(3), "questions:round:3");
        assert_eq!(participant_credentials(99), "participant:credentials:99");
    }

    #[test]
    fn test_list_pattern_covers_all_lists() {
        let pattern = GlobPattern::new(EVENT_LISTS_PATTERN);
        assert!(pattern.matches(&events_list()));
        assert!(pattern.matches(&events_list_admin(4)));
        assert!(!pattern.matches(&event(4)));
    }

    #[test]
    fn test_leaderboard_pattern_covers_rounds_and_events() {
        let pattern = GlobPattern::new(LEADERBOARDS_PATTERN);
        assert!(pattern.matches(&round_leaderboard(1)));
        assert!(pattern.matches(&event_leaderboard(1)));
        assert!(!pattern.matches(&round_questions(1)));
    }
}
