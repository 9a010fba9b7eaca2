//! Topic filter and topic name codec
//!
//! Splits filters and names into their `/`-delimited levels, strips and
//! validates the `$share/<group>/` prefix of shared subscriptions and
//! classifies each filter level.

use crate::constants::limits::MAX_STRING_LENGTH;
use crate::constants::topic::{
    LEVEL_SEPARATOR, MULTI_LEVEL_WILDCARD, SHARED_SUBSCRIPTION_PREFIX, SINGLE_LEVEL_WILDCARD,
    SYSTEM_TOPIC_PREFIX,
};
use crate::error::{Result, SubscriptionError};

/// Kind of a single topic filter level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level<'a> {
    /// A literal level, matched by string equality
    Literal(&'a str),
    /// `+`
    SingleWildcard,
    /// `#`
    MultiWildcard,
}

impl<'a> Level<'a> {
    #[must_use]
    pub fn classify(level: &'a str) -> Self {
        match level {
            SINGLE_LEVEL_WILDCARD => Level::SingleWildcard,
            MULTI_LEVEL_WILDCARD => Level::MultiWildcard,
            literal => Level::Literal(literal),
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Level::Literal(_))
    }
}

/// A validated topic filter with any share prefix split off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilter<'a> {
    /// Share group name, empty for non-shared filters
    pub share_name: &'a str,
    /// Topic filter without the share prefix
    pub filter: &'a str,
    /// Levels of `filter`
    pub levels: Vec<&'a str>,
}

impl ParsedFilter<'_> {
    #[must_use]
    pub fn is_shared(&self) -> bool {
        !self.share_name.is_empty()
    }

    #[must_use]
    pub fn has_wildcards(&self) -> bool {
        self.levels
            .iter()
            .any(|level| Level::classify(level).is_wildcard())
    }
}

/// Parses a raw subscribed name into share name, filter and levels
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidTopicFilter` if the filter is empty,
/// over-long, contains a NUL character, misplaces a wildcard, or carries a
/// malformed `$share/` prefix.
///
/// # Examples
/// ```
/// # use mqtt_v5_subscriptions::topic::parse_filter;
/// let parsed = parse_filter("$share/group/sport/+").unwrap();
/// assert_eq!(parsed.share_name, "group");
/// assert_eq!(parsed.filter, "sport/+");
/// assert_eq!(parsed.levels, vec!["sport", "+"]);
/// ```
pub fn parse_filter(raw: &str) -> Result<ParsedFilter<'_>> {
    let (share_name, filter) = split_shared(raw)?;
    let levels = filter_levels(filter)?;
    Ok(ParsedFilter {
        share_name,
        filter,
        levels,
    })
}

/// Splits a `$share/<group>/<filter>` name into `(group, filter)`
///
/// Non-shared names come back as `("", raw)`. Only the prefix is checked here,
/// the filter part is not validated.
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidTopicFilter` when the group or the
/// filter part is missing, or the group contains a wildcard.
pub fn split_shared(raw: &str) -> Result<(&str, &str)> {
    let Some(rest) = raw.strip_prefix(SHARED_SUBSCRIPTION_PREFIX) else {
        return Ok(("", raw));
    };

    let Some((group, filter)) = rest.split_once(LEVEL_SEPARATOR) else {
        return Err(invalid_filter(raw, "shared subscription without topic filter"));
    };
    validate_share_name(group).map_err(|_| invalid_filter(raw, "invalid share name"))?;
    if filter.is_empty() {
        return Err(invalid_filter(raw, "shared subscription without topic filter"));
    }
    Ok((group, filter))
}

/// Validates the share name of a shared subscription
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidTopicFilter` if the name is empty or
/// contains `/`, `+` or `#`.
pub fn validate_share_name(share_name: &str) -> Result<()> {
    if share_name.is_empty() {
        return Err(invalid_filter(share_name, "empty share name"));
    }
    if share_name.contains([LEVEL_SEPARATOR, '+', '#']) {
        return Err(invalid_filter(
            share_name,
            "share name must not contain '/', '+' or '#'",
        ));
    }
    Ok(())
}

/// Validates a topic filter (without share prefix) and returns its levels
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidTopicFilter` on invalid wildcard usage,
/// an empty or over-long filter, or a NUL character.
pub fn filter_levels(filter: &str) -> Result<Vec<&str>> {
    if filter.is_empty() {
        return Err(invalid_filter(filter, "empty filter"));
    }
    if filter.len() > MAX_STRING_LENGTH as usize {
        return Err(invalid_filter(filter, "filter too long"));
    }
    if filter.contains('\0') {
        return Err(invalid_filter(filter, "null character not allowed"));
    }

    let levels: Vec<&str> = filter.split(LEVEL_SEPARATOR).collect();
    let last = levels.len() - 1;
    for (i, level) in levels.iter().enumerate() {
        // # must be alone and last
        if level.contains('#') && (*level != MULTI_LEVEL_WILDCARD || i != last) {
            return Err(invalid_filter(filter, "invalid multi-level wildcard usage"));
        }
        // + must be alone in its level
        if level.contains('+') && *level != SINGLE_LEVEL_WILDCARD {
            return Err(invalid_filter(filter, "invalid single-level wildcard usage"));
        }
    }
    Ok(levels)
}

/// Splits a concrete topic name into its levels
///
/// # Errors
///
/// Returns `SubscriptionError::InvalidTopicName` if the name is empty,
/// over-long, contains a NUL character or a wildcard, or starts with `$share/`.
pub fn topic_segments(topic: &str) -> Result<Vec<&str>> {
    validate_topic_name(topic)?;
    Ok(topic.split(LEVEL_SEPARATOR).collect())
}

/// Validates a concrete topic name
///
/// # Errors
///
/// See [`topic_segments`].
pub fn validate_topic_name(topic: &str) -> Result<()> {
    let reason = if topic.is_empty() {
        "empty topic"
    } else if topic.len() > MAX_STRING_LENGTH as usize {
        "topic too long"
    } else if topic.contains('\0') {
        "null character not allowed"
    } else if topic.contains(['+', '#']) {
        "wildcards not allowed in topic names"
    } else if topic.starts_with(SHARED_SUBSCRIPTION_PREFIX) {
        "shared subscription prefix not allowed in topic names"
    } else {
        return Ok(());
    };
    Err(SubscriptionError::InvalidTopicName(format!(
        "{topic}: {reason}"
    )))
}

/// Whether a topic or filter addresses the system (`$`-prefixed) namespace
#[must_use]
pub fn is_system_topic(topic: &str) -> bool {
    topic.starts_with(SYSTEM_TOPIC_PREFIX)
}

/// Rebuilds the full subscribed name from a share name and a filter
#[must_use]
pub fn shared_topic(share_name: &str, filter: &str) -> String {
    if share_name.is_empty() {
        filter.to_string()
    } else {
        format!("{SHARED_SUBSCRIPTION_PREFIX}{share_name}/{filter}")
    }
}

fn invalid_filter(filter: &str, reason: &str) -> SubscriptionError {
    SubscriptionError::InvalidTopicFilter(format!("{filter}: {reason}"))
}
