//! # MQTT v5.0 Subscription Store
//!
//! The subscription registry and topic matching engine of an MQTT v5.0 broker.
//!
//! The store keeps, per client id, the topic filters the client subscribed to
//! together with their subscription options, and answers which client and
//! subscription pairs match a published topic. Shared subscriptions
//! (`$share/<group>/<filter>`) are stored with their group name; choosing a
//! group member to deliver to is left to the caller.
//!
//! Everything here is synchronous in-memory work. Wire decoding, sessions,
//! retained messages and delivery live in the layers around it.
//!
//! ## Example
//!
//! ```rust
//! use mqtt_v5_subscriptions::{
//!     QoS, SubscribedTopic, Subscription, SubscriptionStore, SubscriptionType,
//! };
//!
//! let store = SubscriptionStore::new();
//!
//! let topic = SubscribedTopic::new("$share/workers/jobs/+", QoS::AtLeastOnce);
//! let shared = Subscription::from_topic(&topic, 0).unwrap();
//! store.subscribe("worker-1", [shared]);
//! store.subscribe("monitor", [Subscription::new("jobs/#", QoS::AtMostOnce)]);
//!
//! let matched = store.topic_matched("jobs/42", SubscriptionType::ALL).unwrap();
//! assert_eq!(matched.len(), 2);
//! assert_eq!(matched["worker-1"][0].share_name(), "workers");
//!
//! store.unsubscribe_all("worker-1");
//! assert_eq!(store.get_stats().subscriptions_current, 1);
//! ```

#![warn(clippy::pedantic)]

pub mod config;
pub mod constants;
pub mod error;
pub mod store;
pub mod subscription;
pub mod topic;
pub mod topic_matching;
pub mod types;

pub use config::StoreConfig;
pub use error::{Result, SubscriptionError};
pub use store::{ClientSubscriptions, IterationOptions, Stats, SubscribeResult, SubscriptionStore};
pub use subscription::{Subscription, SubscriptionOptions};
pub use topic_matching::{matches, MatchType, SubscriptionType};
pub use types::{QoS, RetainHandling, SubscribedTopic};
