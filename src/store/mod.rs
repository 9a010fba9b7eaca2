//! In-memory subscription store
//!
//! Registers topic filters per client and answers "who is subscribed to this
//! topic" queries for message routing.
//!
//! One readers-writer lock guards the subscription tree, the client reverse
//! index and the counters as a single consistency domain. Subscribe and
//! unsubscribe take the write path; iteration and stats reads take the read
//! path. Iteration runs the callback while holding it, so callbacks must not
//! call back into the store.

mod index;
mod stats;

pub use stats::Stats;

use crate::config::StoreConfig;
use crate::constants::topic::LEVEL_SEPARATOR;
use crate::error::{Result, SubscriptionError};
use crate::subscription::Subscription;
use crate::topic::{
    filter_levels, parse_filter, split_shared, topic_segments, validate_share_name, Level,
};
use crate::topic_matching::{matches_levels, MatchType, SubscriptionType};
use index::SubscriptionIndex;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Subscriptions grouped by client id
pub type ClientSubscriptions = HashMap<String, Vec<Subscription>>;

/// Outcome of one subscription of a `subscribe` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResult {
    /// The stored subscription
    pub subscription: Subscription,
    /// Whether the (client, filter, share name) key was already present
    pub already_existed: bool,
}

/// Selects what `SubscriptionStore::iterate` walks
///
/// - `client_id` set: only that client's subscriptions, additionally filtered
///   by `topic_name` when both are set.
/// - only `topic_name` set: subscriptions equal to (`MatchName`) or matching
///   (`MatchFilter`) the topic.
/// - neither set: every subscription in the store. This is expensive, do not
///   call it on a hot path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationOptions {
    pub subscription_type: SubscriptionType,
    pub client_id: Option<String>,
    /// Topic name for `MatchFilter`, topic filter for `MatchName`
    pub topic_name: Option<String>,
    /// Only used when `topic_name` is set
    pub match_type: MatchType,
}

impl IterationOptions {
    #[must_use]
    pub fn new(subscription_type: SubscriptionType) -> Self {
        Self {
            subscription_type,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_topic_name(mut self, topic_name: impl Into<String>) -> Self {
        self.topic_name = Some(topic_name.into());
        self
    }

    #[must_use]
    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }
}

/// A validated `topic_name` query
enum TopicQuery<'a> {
    Name {
        share_name: &'a str,
        topic_filter: &'a str,
    },
    Filter {
        levels: Vec<&'a str>,
    },
}

impl<'a> TopicQuery<'a> {
    fn parse(topic_name: &'a str, match_type: MatchType) -> Result<Self> {
        match match_type {
            MatchType::MatchName => {
                let parsed = parse_filter(topic_name)?;
                Ok(TopicQuery::Name {
                    share_name: parsed.share_name,
                    topic_filter: parsed.filter,
                })
            }
            MatchType::MatchFilter => Ok(TopicQuery::Filter {
                levels: topic_segments(topic_name)?,
            }),
        }
    }

    fn accepts(&self, subscription: &Subscription) -> bool {
        match self {
            TopicQuery::Name {
                share_name,
                topic_filter,
            } => {
                subscription.topic_filter() == *topic_filter
                    && subscription.share_name() == *share_name
            }
            TopicQuery::Filter { levels } => {
                let filter: Vec<&str> = subscription.topic_filter().split(LEVEL_SEPARATOR).collect();
                matches_levels(levels, &filter)
            }
        }
    }
}

/// In-memory subscription store
///
/// Explicitly constructed and owned; share it between threads with `Arc`.
///
/// # Examples
///
/// ```
/// use mqtt_v5_subscriptions::{QoS, Subscription, SubscriptionStore, SubscriptionType};
///
/// let store = SubscriptionStore::new();
/// store.subscribe("client1", [Subscription::new("sport/+/player1", QoS::AtLeastOnce)]);
///
/// let matched = store.topic_matched("sport/tennis/player1", SubscriptionType::ALL).unwrap();
/// assert_eq!(matched["client1"].len(), 1);
/// ```
#[derive(Debug)]
pub struct SubscriptionStore {
    index: RwLock<SubscriptionIndex>,
    config: StoreConfig,
}

impl SubscriptionStore {
    /// Creates a store with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: RwLock::new(SubscriptionIndex::new()),
            config: StoreConfig::default(),
        }
    }

    /// Creates a store with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Adds subscriptions to a client
    ///
    /// The client does not need to exist; the subscriptions apply to any later
    /// session with this client id. Each entry succeeds or fails on its own:
    /// an invalid filter rejects only that entry. Re-subscribing an existing
    /// (filter, share name) key replaces its options in place and reports
    /// `already_existed`.
    pub fn subscribe<I>(&self, client_id: &str, subscriptions: I) -> Vec<Result<SubscribeResult>>
    where
        I: IntoIterator<Item = Subscription>,
    {
        let mut index = self.index.write();
        subscriptions
            .into_iter()
            .map(|subscription| {
                self.check_subscription(&index, client_id, &subscription)
                    .inspect_err(|e| {
                        warn!(
                            "Rejected subscription {} for client {}: {}",
                            subscription.topic(),
                            client_id,
                            e
                        );
                    })?;

                let already_existed = index.insert(client_id, subscription.clone());
                debug!(
                    "Client {} subscribed to {} (existed: {})",
                    client_id,
                    subscription.topic(),
                    already_existed
                );
                Ok(SubscribeResult {
                    subscription,
                    already_existed,
                })
            })
            .collect()
    }

    fn check_subscription(
        &self,
        index: &SubscriptionIndex,
        client_id: &str,
        subscription: &Subscription,
    ) -> Result<()> {
        let topic_filter = subscription.topic_filter();
        let levels = filter_levels(topic_filter)?;

        // The share prefix belongs in the share name, never in the filter
        let (embedded_share, _) = split_shared(topic_filter)?;
        if !embedded_share.is_empty() {
            return Err(SubscriptionError::InvalidTopicFilter(format!(
                "{topic_filter}: share prefix inside topic filter"
            )));
        }
        if subscription.is_shared() {
            validate_share_name(subscription.share_name())?;
        }

        if self.config.max_topic_levels > 0 && levels.len() > self.config.max_topic_levels {
            return Err(SubscriptionError::InvalidTopicFilter(format!(
                "{topic_filter}: more than {} levels",
                self.config.max_topic_levels
            )));
        }
        if subscription.is_shared() && !self.config.shared_subscription_available {
            return Err(SubscriptionError::SharedSubscriptionNotSupported);
        }
        if !self.config.wildcard_subscription_available
            && levels.iter().any(|level| Level::classify(level).is_wildcard())
        {
            return Err(SubscriptionError::WildcardSubscriptionNotSupported);
        }
        if subscription.has_id() && !self.config.subscription_identifier_available {
            return Err(SubscriptionError::SubscriptionIdentifierNotSupported);
        }

        let max = self.config.max_subscriptions_per_client;
        if max > 0 && !index.contains(client_id, topic_filter, subscription.share_name()) {
            let current = index
                .client_stats(client_id)
                .map_or(0, |stats| stats.subscriptions_current);
            if current >= max as u64 {
                return Err(SubscriptionError::QuotaExceeded {
                    client_id: client_id.to_string(),
                    max,
                });
            }
        }
        Ok(())
    }

    /// Removes subscriptions of a client by exact topic filter string
    ///
    /// Shared and non-shared subscriptions under the same filter string are
    /// removed together. Absent filters are ignored. Returns the number of
    /// removed subscriptions.
    pub fn unsubscribe<I, S>(&self, client_id: &str, topic_filters: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = self.index.write();
        let mut removed = 0;
        for topic_filter in topic_filters {
            let topic_filter = topic_filter.as_ref();
            let count = index.remove(client_id, topic_filter);
            if count > 0 {
                debug!("Client {} unsubscribed from {}", client_id, topic_filter);
            }
            removed += count;
        }
        removed
    }

    /// Removes all subscriptions of a client
    ///
    /// Called by the session layer on disconnect or session expiry. Unknown
    /// clients are ignored. Returns the number of removed subscriptions.
    pub fn unsubscribe_all(&self, client_id: &str) -> usize {
        let removed = self.index.write().remove_client(client_id);
        if removed > 0 {
            debug!(
                "Removed {} subscriptions of client {}",
                removed, client_id
            );
        }
        removed
    }

    /// Iterates subscriptions selected by `options`
    ///
    /// The callback is called once per subscription and stops the iteration
    /// by returning false. No ordering of any kind is guaranteed. The read lock
    /// is held for the whole walk; the callback must not call into the store.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTopicName` for a malformed topic with `MatchFilter`, or
    /// `InvalidTopicFilter` for a malformed filter with `MatchName`.
    pub fn iterate<F>(&self, mut f: F, options: &IterationOptions) -> Result<()>
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        let query = options
            .topic_name
            .as_deref()
            .map(|topic_name| TopicQuery::parse(topic_name, options.match_type))
            .transpose()?;

        let subscription_type = options.subscription_type;
        let mut hits = 0usize;
        let mut visit = |client_id: &str, subscription: &Subscription| {
            if !subscription_type.admits(subscription.share_name(), subscription.topic_filter()) {
                return true;
            }
            hits += 1;
            f(client_id, subscription)
        };

        let index = self.index.read();
        match (options.client_id.as_deref(), &query) {
            (Some(client_id), Some(query)) => {
                index.walk_client(client_id, &mut |client_id, subscription| {
                    !query.accepts(subscription) || visit(client_id, subscription)
                });
            }
            (Some(client_id), None) => {
                index.walk_client(client_id, &mut visit);
            }
            (
                None,
                Some(TopicQuery::Name {
                    share_name,
                    topic_filter,
                }),
            ) => {
                index.walk_name(topic_filter, *share_name, &mut visit);
            }
            (None, Some(TopicQuery::Filter { levels })) => {
                index.walk_matches(levels, &mut visit);
            }
            (None, None) => {
                index.walk_all(&mut visit);
            }
        }
        drop(index);

        trace!("Iteration {:?} visited {} subscriptions", options, hits);
        Ok(())
    }

    /// Returns the store-wide statistics
    #[must_use]
    pub fn get_stats(&self) -> Stats {
        self.index.read().stats()
    }

    /// Returns the statistics of one client
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::NotFound` if the client holds no subscriptions
    pub fn get_client_stats(&self, client_id: &str) -> Result<Stats> {
        self.index
            .read()
            .client_stats(client_id)
            .ok_or_else(|| SubscriptionError::NotFound(client_id.to_string()))
    }

    /// Returns the subscriptions matching a published topic, grouped by client
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::InvalidTopicName` if `topic` is not a valid topic name
    pub fn topic_matched(
        &self,
        topic: &str,
        subscription_type: SubscriptionType,
    ) -> Result<ClientSubscriptions> {
        self.collect_grouped(
            IterationOptions::new(subscription_type)
                .with_topic_name(topic)
                .with_match_type(MatchType::MatchFilter),
        )
    }

    /// Returns the subscriptions stored under exactly this filter, grouped by client
    ///
    /// Without a `$share/<group>/` prefix only non-shared subscriptions are
    /// returned; with one, only that share group's.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::InvalidTopicFilter` if `topic_filter` is malformed
    pub fn get(
        &self,
        topic_filter: &str,
        subscription_type: SubscriptionType,
    ) -> Result<ClientSubscriptions> {
        self.collect_grouped(
            IterationOptions::new(subscription_type)
                .with_topic_name(topic_filter)
                .with_match_type(MatchType::MatchName),
        )
    }

    /// Returns the subscriptions of one client
    #[must_use]
    pub fn client_subscriptions(
        &self,
        client_id: &str,
        subscription_type: SubscriptionType,
    ) -> Vec<Subscription> {
        let mut subscriptions = Vec::new();
        self.index.read().walk_client(client_id, &mut |_, subscription| {
            if subscription_type.admits(subscription.share_name(), subscription.topic_filter()) {
                subscriptions.push(subscription.clone());
            }
            true
        });
        subscriptions
    }

    fn collect_grouped(&self, options: IterationOptions) -> Result<ClientSubscriptions> {
        let mut grouped = ClientSubscriptions::new();
        self.iterate(
            |client_id, subscription| {
                grouped
                    .entry(client_id.to_string())
                    .or_default()
                    .push(subscription.clone());
                true
            },
            &options,
        )?;
        Ok(grouped)
    }
}

impl Default for SubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}
