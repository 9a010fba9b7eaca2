//! Topic matching implementation for MQTT
//!
//! Matching rules shared by the subscription index and standalone callers:
//! single-level (+) and multi-level (#) wildcards, the `$` system topic rule
//! and the subscription type mask used to pre-filter results.

use crate::constants::topic::{MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD};
use crate::topic::{filter_levels, is_system_topic, topic_segments};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Matches a topic name against a topic filter with wildcard support
///
/// # Arguments
/// * `topic` - The topic name to match (no wildcards allowed)
/// * `filter` - The topic filter which may contain wildcards, without share prefix
///
/// # Returns
/// * `true` if the topic matches the filter
/// * `false` otherwise, including when either side is invalid
///
/// # Examples
/// ```
/// # use mqtt_v5_subscriptions::topic_matching::matches;
/// assert!(matches("sport/tennis", "sport/tennis"));
/// assert!(matches("sport/tennis", "sport/+"));
/// assert!(matches("sport/tennis/player1", "sport/#"));
/// assert!(!matches("sport/tennis", "sport/+/player1"));
/// assert!(!matches("$SYS/broker", "#"));
/// ```
#[must_use]
pub fn matches(topic: &str, filter: &str) -> bool {
    let (Ok(topic_levels), Ok(filter_levels)) = (topic_segments(topic), filter_levels(filter))
    else {
        return false;
    };

    // Fast path for exact match
    if topic == filter {
        return true;
    }

    matches_levels(&topic_levels, &filter_levels)
}

/// Matches pre-split topic levels against pre-split filter levels
///
/// Both sides must already be validated. A wildcard in the first filter level
/// never matches a topic whose first level starts with `$`.
#[must_use]
pub fn matches_levels(topic_levels: &[&str], filter_levels: &[&str]) -> bool {
    if let (Some(first_topic), Some(first_filter)) = (topic_levels.first(), filter_levels.first())
    {
        if is_system_topic(first_topic)
            && (*first_filter == SINGLE_LEVEL_WILDCARD || *first_filter == MULTI_LEVEL_WILDCARD)
        {
            return false;
        }
    }
    match_parts(topic_levels, filter_levels)
}

/// Recursive helper for matching topic parts against filter parts
fn match_parts(topic_parts: &[&str], filter_parts: &[&str]) -> bool {
    match (topic_parts.first(), filter_parts.first()) {
        // Both exhausted - match
        (None, None) => true,

        // # matches the parent level and everything below it
        (_, Some(&MULTI_LEVEL_WILDCARD)) => filter_parts.len() == 1,

        (None, Some(_)) | (Some(_), None) => false,

        (Some(&topic_part), Some(&filter_part)) => {
            let level_match = filter_part == SINGLE_LEVEL_WILDCARD || filter_part == topic_part;
            level_match && match_parts(&topic_parts[1..], &filter_parts[1..])
        }
    }
}

/// How `IterationOptions::topic_name` is compared against stored filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    /// String equality of share name and filter
    MatchName,
    /// Wildcard matching of a concrete topic name against every stored filter
    #[default]
    MatchFilter,
}

/// Bitmask selecting which kinds of subscriptions a query returns
///
/// A subscription is selected when any of the set bits admits it:
/// `SYS` admits filters whose first level starts with `$`, `SHARED` admits
/// shared subscriptions, `NON_SHARED` admits the rest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionType(u8);

impl SubscriptionType {
    pub const SYS: Self = Self(0b001);
    pub const SHARED: Self = Self(0b010);
    pub const NON_SHARED: Self = Self(0b100);
    pub const ALL: Self = Self(0b111);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether a subscription with this share name and filter is selected
    #[must_use]
    pub fn admits(self, share_name: &str, topic_filter: &str) -> bool {
        (self.contains(Self::SYS) && is_system_topic(topic_filter))
            || (self.contains(Self::SHARED) && !share_name.is_empty())
            || (self.contains(Self::NON_SHARED) && share_name.is_empty())
    }
}

impl Default for SubscriptionType {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SubscriptionType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SubscriptionType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::SYS, "SYS"),
            (Self::SHARED, "SHARED"),
            (Self::NON_SHARED, "NON_SHARED"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.contains(*bit))
        .map(|(_, name)| name)
        .collect();
        write!(f, "SubscriptionType({})", names.join(" | "))
    }
}
