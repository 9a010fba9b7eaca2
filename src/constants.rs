//! MQTT topic and subscription constants
//!
//! This module defines the constants shared by the topic codec, the matcher
//! and the store to avoid magic strings throughout the codebase.

/// Topic syntax
pub mod topic {
    /// Topic level separator
    pub const LEVEL_SEPARATOR: char = '/';

    /// Single-level wildcard
    pub const SINGLE_LEVEL_WILDCARD: &str = "+";

    /// Multi-level wildcard
    pub const MULTI_LEVEL_WILDCARD: &str = "#";

    /// Prefix of a shared subscription filter
    pub const SHARED_SUBSCRIPTION_PREFIX: &str = "$share/";

    /// First character of a system topic level
    pub const SYSTEM_TOPIC_PREFIX: char = '$';
}

/// Subscription option values
pub mod subscription {
    /// Subscription identifier value meaning "no identifier"
    pub const NO_IDENTIFIER: u32 = 0;
}

/// Protocol limits
pub mod limits {
    /// Maximum string length in MQTT (65535)
    pub const MAX_STRING_LENGTH: u16 = u16::MAX;

    /// Most levels a maximum-length string can hold
    pub const MAX_TOPIC_LEVELS: usize = (MAX_STRING_LENGTH as usize + 1) / 2;
}
