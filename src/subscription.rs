use crate::constants::subscription::NO_IDENTIFIER;
use crate::error::Result;
use crate::topic::{is_system_topic, shared_topic, split_shared};
use crate::topic_matching::SubscriptionType;
use crate::types::{QoS, RetainHandling, SubscribedTopic};

/// Optional attributes of a subscription
///
/// Everything except the topic filter and the `QoS`, applied by
/// [`Subscription::with_options`] before the subscription is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionOptions {
    /// Share group name, empty for a non-shared subscription
    pub share_name: String,
    /// Subscription identifier, 0 means none
    pub id: u32,
    /// No Local - if true, messages published by this client are not forwarded back to it
    pub no_local: bool,
    /// Retain As Published - if true, keep the RETAIN flag as published
    pub retain_as_published: bool,
    /// Retain Handling option
    pub retain_handling: RetainHandling,
}

impl SubscriptionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the share group name of a shared subscription
    #[must_use]
    pub fn with_share_name(mut self, share_name: impl Into<String>) -> Self {
        self.share_name = share_name.into();
        self
    }

    /// Sets the subscription identifier
    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_no_local(mut self, no_local: bool) -> Self {
        self.no_local = no_local;
        self
    }

    #[must_use]
    pub fn with_retain_as_published(mut self, rap: bool) -> Self {
        self.retain_as_published = rap;
        self
    }

    #[must_use]
    pub fn with_retain_handling(mut self, rh: RetainHandling) -> Self {
        self.retain_handling = rh;
        self
    }
}

/// A subscription to a topic filter
///
/// Immutable once built. The topic filter never carries the `$share/` prefix;
/// shared subscriptions keep their group in `share_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    topic_filter: String,
    qos: QoS,
    options: SubscriptionOptions,
}

impl Subscription {
    /// Creates a non-shared subscription with default options
    #[must_use]
    pub fn new(topic_filter: impl Into<String>, qos: QoS) -> Self {
        Self::with_options(topic_filter, qos, SubscriptionOptions::default())
    }

    /// Creates a subscription with explicit options
    #[must_use]
    pub fn with_options(
        topic_filter: impl Into<String>,
        qos: QoS,
        options: SubscriptionOptions,
    ) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            qos,
            options,
        }
    }

    /// Builds a subscription from a decoded SUBSCRIBE topic entry
    ///
    /// A `$share/<group>/<filter>` name is split into share name and filter.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::InvalidTopicFilter` if the share prefix is malformed
    pub fn from_topic(topic: &SubscribedTopic, id: u32) -> Result<Self> {
        let (share_name, topic_filter) = split_shared(&topic.name)?;
        Ok(Self {
            topic_filter: topic_filter.to_string(),
            qos: topic.qos,
            options: SubscriptionOptions {
                share_name: share_name.to_string(),
                id,
                no_local: topic.no_local,
                retain_as_published: topic.retain_as_published,
                retain_handling: topic.retain_handling,
            },
        })
    }

    /// Share name of a shared subscription, "" otherwise
    #[must_use]
    pub fn share_name(&self) -> &str {
        &self.options.share_name
    }

    /// Topic filter without the share prefix
    #[must_use]
    pub fn topic_filter(&self) -> &str {
        &self.topic_filter
    }

    /// Subscription identifier, 0 if none
    #[must_use]
    pub fn id(&self) -> u32 {
        self.options.id
    }

    #[must_use]
    pub fn has_id(&self) -> bool {
        self.options.id != NO_IDENTIFIER
    }

    #[must_use]
    pub fn qos(&self) -> QoS {
        self.qos
    }

    #[must_use]
    pub fn no_local(&self) -> bool {
        self.options.no_local
    }

    #[must_use]
    pub fn retain_as_published(&self) -> bool {
        self.options.retain_as_published
    }

    #[must_use]
    pub fn retain_handling(&self) -> RetainHandling {
        self.options.retain_handling
    }

    #[must_use]
    pub fn options(&self) -> &SubscriptionOptions {
        &self.options
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        !self.options.share_name.is_empty()
    }

    /// The kind of this subscription as a single-bit type mask
    ///
    /// Shared wins over system, so `$share/g/$SYS/#` is `SHARED`.
    #[must_use]
    pub fn subscription_type(&self) -> SubscriptionType {
        if self.is_shared() {
            SubscriptionType::SHARED
        } else if is_system_topic(&self.topic_filter) {
            SubscriptionType::SYS
        } else {
            SubscriptionType::NON_SHARED
        }
    }

    /// The full subscribed name, `$share/<group>/<filter>` for shared subscriptions
    #[must_use]
    pub fn topic(&self) -> String {
        shared_topic(&self.options.share_name, &self.topic_filter)
    }
}
