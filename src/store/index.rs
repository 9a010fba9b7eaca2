//! Segment-keyed subscription tree with a per-client reverse index
//!
//! Every filter level is a child key, wildcards included, so `sport/+/#` lives
//! under the children `sport` -> `+` -> `#`. The subscribers of each exact
//! filter string live in a flat map keyed by the filter, then by client id and
//! then by share name ("" for the non-shared subscription). The node a filter
//! ends at names its key in that map, so wildcard walks go through the tree
//! and exact name lookups skip it.

use super::stats::Stats;
use crate::constants::topic::{LEVEL_SEPARATOR, MULTI_LEVEL_WILDCARD, SINGLE_LEVEL_WILDCARD};
use crate::subscription::Subscription;
use crate::topic::is_system_topic;
use std::collections::HashMap;

/// Share name -> subscription
type ShareEntries = HashMap<String, Subscription>;

/// Client id -> share entries of one exact filter
type Subscribers = HashMap<String, ShareEntries>;

#[derive(Debug, Default)]
struct TopicNode {
    /// Child nodes keyed by the next filter level
    children: HashMap<String, TopicNode>,
    /// Filter ending at this node while it has subscribers, key into `SubscriptionIndex::filters`
    filter: Option<String>,
}

impl TopicNode {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.filter.is_none()
    }
}

/// Calls `f` for every subscription of one filter, stops when it returns false
fn visit<F>(subscribers: &Subscribers, f: &mut F) -> bool
where
    F: FnMut(&str, &Subscription) -> bool,
{
    for (client_id, entries) in subscribers {
        for sub in entries.values() {
            if !f(client_id, sub) {
                return false;
            }
        }
    }
    true
}

#[derive(Debug, Default)]
struct ClientEntry {
    /// Topic filter -> share name -> subscription
    filters: HashMap<String, ShareEntries>,
    stats: Stats,
}

/// The subscription tree, the exact filter map and the client reverse index,
/// together with the store-wide counters
///
/// Not synchronized; the store wraps it in a lock.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionIndex {
    root: TopicNode,
    filters: HashMap<String, Subscribers>,
    clients: HashMap<String, ClientEntry>,
    stats: Stats,
}

impl SubscriptionIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the (client, filter, share name) entry
    ///
    /// Returns whether that exact key already existed.
    pub(crate) fn insert(&mut self, client_id: &str, subscription: Subscription) -> bool {
        let topic_filter = subscription.topic_filter();
        if !self.filters.contains_key(topic_filter) {
            let mut node = &mut self.root;
            for level in topic_filter.split(LEVEL_SEPARATOR) {
                node = node.children.entry(level.to_string()).or_default();
            }
            node.filter = Some(topic_filter.to_string());
        }

        let existed = self
            .filters
            .entry(topic_filter.to_string())
            .or_default()
            .entry(client_id.to_string())
            .or_default()
            .insert(subscription.share_name().to_string(), subscription.clone())
            .is_some();

        let entry = self.clients.entry(client_id.to_string()).or_default();
        entry
            .filters
            .entry(subscription.topic_filter().to_string())
            .or_default()
            .insert(subscription.share_name().to_string(), subscription);
        if !existed {
            entry.stats.record_added();
            self.stats.record_added();
        }
        existed
    }

    /// Whether the (client, filter, share name) key is stored
    pub(crate) fn contains(&self, client_id: &str, topic_filter: &str, share_name: &str) -> bool {
        self.clients
            .get(client_id)
            .and_then(|entry| entry.filters.get(topic_filter))
            .is_some_and(|shares| shares.contains_key(share_name))
    }

    /// Removes every entry of the client under this exact filter string,
    /// shared and non-shared alike, and prunes emptied nodes
    ///
    /// Returns the number of removed subscriptions.
    pub(crate) fn remove(&mut self, client_id: &str, topic_filter: &str) -> usize {
        let Some(entry) = self.clients.get_mut(client_id) else {
            return 0;
        };
        let Some(shares) = entry.filters.remove(topic_filter) else {
            return 0;
        };
        let removed = shares.len();
        entry.stats.record_removed(removed as u64);
        if entry.filters.is_empty() {
            self.clients.remove(client_id);
        }

        self.detach(client_id, topic_filter);
        self.stats.record_removed(removed as u64);
        removed
    }

    /// Removes all subscriptions of a client in O(its filter count)
    ///
    /// Returns the number of removed subscriptions.
    pub(crate) fn remove_client(&mut self, client_id: &str) -> usize {
        let Some(entry) = self.clients.remove(client_id) else {
            return 0;
        };
        let mut removed = 0;
        for (topic_filter, shares) in &entry.filters {
            self.detach(client_id, topic_filter);
            removed += shares.len();
        }
        self.stats.record_removed(removed as u64);
        removed
    }

    /// Drops the client from the filter's subscribers, pruning the tree path
    /// once nobody is left on it
    fn detach(&mut self, client_id: &str, topic_filter: &str) {
        let Some(subscribers) = self.filters.get_mut(topic_filter) else {
            return;
        };
        subscribers.remove(client_id);
        if subscribers.is_empty() {
            self.filters.remove(topic_filter);
            let levels: Vec<&str> = topic_filter.split(LEVEL_SEPARATOR).collect();
            Self::prune(&mut self.root, &levels);
        }
    }

    fn prune(node: &mut TopicNode, levels: &[&str]) {
        match levels.split_first() {
            None => node.filter = None,
            Some((level, rest)) => {
                if let Some(child) = node.children.get_mut(*level) {
                    Self::prune(child, rest);
                    if child.is_empty() {
                        node.children.remove(*level);
                    }
                }
            }
        }
    }

    /// Store-wide counters
    pub(crate) fn stats(&self) -> Stats {
        self.stats
    }

    pub(crate) fn client_stats(&self, client_id: &str) -> Option<Stats> {
        self.clients.get(client_id).map(|entry| entry.stats)
    }

    /// Walks one client's subscriptions through the reverse index
    pub(crate) fn walk_client<F>(&self, client_id: &str, f: &mut F) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        let Some(entry) = self.clients.get(client_id) else {
            return true;
        };
        for sub in entry.filters.values().flat_map(HashMap::values) {
            if !f(client_id, sub) {
                return false;
            }
        }
        true
    }

    /// Walks every stored subscription
    pub(crate) fn walk_all<F>(&self, f: &mut F) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        for (client_id, entry) in &self.clients {
            for sub in entry.filters.values().flat_map(HashMap::values) {
                if !f(client_id, sub) {
                    return false;
                }
            }
        }
        true
    }

    /// Walks the subscriptions stored under exactly this share name and filter
    ///
    /// An empty share name selects the non-shared subscriptions.
    pub(crate) fn walk_name<F>(&self, topic_filter: &str, share_name: &str, f: &mut F) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        let Some(subscribers) = self.filters.get(topic_filter) else {
            return true;
        };
        for (client_id, entries) in subscribers {
            if let Some(sub) = entries.get(share_name) {
                if !f(client_id, sub) {
                    return false;
                }
            }
        }
        true
    }

    /// Walks every subscription whose filter matches the topic levels
    pub(crate) fn walk_matches<F>(&self, topic_levels: &[&str], f: &mut F) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        // Wildcards at the first level never match a $ topic
        let system = topic_levels.first().is_some_and(|level| is_system_topic(level));
        self.collect_matches(&self.root, topic_levels, !system, f)
    }

    fn collect_matches<F>(
        &self,
        node: &TopicNode,
        topic_levels: &[&str],
        wildcards: bool,
        f: &mut F,
    ) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        // # matches this level and everything below, including the parent itself
        if wildcards {
            if let Some(multi) = node.children.get(MULTI_LEVEL_WILDCARD) {
                if !self.visit_node(multi, f) {
                    return false;
                }
            }
        }

        let Some((level, rest)) = topic_levels.split_first() else {
            return self.visit_node(node, f);
        };

        if let Some(child) = node.children.get(*level) {
            if !self.collect_matches(child, rest, true, f) {
                return false;
            }
        }
        if wildcards {
            if let Some(single) = node.children.get(SINGLE_LEVEL_WILDCARD) {
                if !self.collect_matches(single, rest, true, f) {
                    return false;
                }
            }
        }
        true
    }

    fn visit_node<F>(&self, node: &TopicNode, f: &mut F) -> bool
    where
        F: FnMut(&str, &Subscription) -> bool,
    {
        node.filter
            .as_deref()
            .and_then(|topic_filter| self.filters.get(topic_filter))
            .map_or(true, |subscribers| visit(subscribers, f))
    }

    /// Number of tree nodes below the root
    #[cfg(test)]
    fn node_count(&self) -> usize {
        fn count(node: &TopicNode) -> usize {
            node.children.values().map(|child| 1 + count(child)).sum()
        }
        count(&self.root)
    }
}
