use serde::{Deserialize, Serialize};

/// Statistics of the store or of a single client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// How many subscriptions have been added. Re-subscribing an existing
    /// (client, filter, share name) key is not counted.
    pub subscriptions_total: u64,
    /// How many subscriptions are currently stored
    pub subscriptions_current: u64,
}

impl Stats {
    pub(crate) fn record_added(&mut self) {
        self.subscriptions_total += 1;
        self.subscriptions_current += 1;
    }

    pub(crate) fn record_removed(&mut self, count: u64) {
        self.subscriptions_current = self.subscriptions_current.saturating_sub(count);
    }
}
