//! Integration tests for the subscription store
//!
//! Exercises the public store API end to end: subscribe and unsubscribe
//! bookkeeping, topic matching through iteration, shared subscription
//! filtering and concurrent access.

use mqtt_v5_subscriptions::{
    IterationOptions, MatchType, QoS, RetainHandling, SubscribedTopic, Subscription,
    SubscriptionError, SubscriptionOptions, SubscriptionStore, SubscriptionType,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
}

fn collect(store: &SubscriptionStore, options: &IterationOptions) -> Vec<(String, String)> {
    let mut seen = Vec::new();
    store
        .iterate(
            |client_id, subscription| {
                seen.push((client_id.to_string(), subscription.topic()));
                true
            },
            options,
        )
        .unwrap();
    seen.sort();
    seen
}

fn matching_clients(store: &SubscriptionStore, topic: &str) -> BTreeSet<String> {
    store
        .topic_matched(topic, SubscriptionType::ALL)
        .unwrap()
        .into_keys()
        .collect()
}

#[test]
fn test_wildcard_routing() {
    init_tracing();
    let store = SubscriptionStore::new();
    store.subscribe("all", [Subscription::new("#", QoS::AtMostOnce)]);
    store.subscribe(
        "player",
        [Subscription::new("sport/+/player1", QoS::AtLeastOnce)],
    );
    store.subscribe("tennis", [Subscription::new("+/tennis/#", QoS::AtMostOnce)]);
    store.subscribe("sys", [Subscription::new("$SYS/#", QoS::AtMostOnce)]);

    assert_eq!(matching_clients(&store, "a"), BTreeSet::from(["all".to_string()]));
    assert_eq!(
        matching_clients(&store, "a/b/c"),
        BTreeSet::from(["all".to_string()])
    );
    assert_eq!(
        matching_clients(&store, "sport/tennis/player1"),
        BTreeSet::from([
            "all".to_string(),
            "player".to_string(),
            "tennis".to_string()
        ])
    );
    assert_eq!(
        matching_clients(&store, "sport/tennis/player1/ranking"),
        BTreeSet::from(["all".to_string(), "tennis".to_string()])
    );
    assert_eq!(
        matching_clients(&store, "sport/player1"),
        BTreeSet::from(["all".to_string()])
    );

    // Wildcards at the first level never reach the system namespace
    assert_eq!(
        matching_clients(&store, "$SYS/tennis/foo"),
        BTreeSet::from(["sys".to_string()])
    );
}

#[test]
fn test_match_independent_of_insertion_order() {
    let filters = ["a/+", "a/#", "+/b", "a/b", "#", "a/b/c", "+/+"];
    let topics = ["a/b", "a", "x/b", "a/b/c", "b"];

    let forward = SubscriptionStore::new();
    for (i, filter) in filters.iter().enumerate() {
        forward.subscribe(&format!("c{i}"), [Subscription::new(*filter, QoS::AtMostOnce)]);
    }
    let backward = SubscriptionStore::new();
    for (i, filter) in filters.iter().enumerate().rev() {
        backward.subscribe(&format!("c{i}"), [Subscription::new(*filter, QoS::AtMostOnce)]);
    }

    for topic in topics {
        let options = IterationOptions::new(SubscriptionType::ALL).with_topic_name(topic);
        assert_eq!(
            collect(&forward, &options),
            collect(&backward, &options),
            "topic {topic}"
        );
    }
}

#[test]
fn test_shared_subscription_from_topic() {
    let topic = SubscribedTopic::new("$share/groupA/sport/tennis", QoS::ExactlyOnce)
        .with_no_local(true)
        .with_retain_handling(RetainHandling::DontSend);
    let subscription = Subscription::from_topic(&topic, 7).unwrap();

    assert_eq!(subscription.share_name(), "groupA");
    assert_eq!(subscription.topic_filter(), "sport/tennis");
    assert_eq!(
        format!(
            "$share/{}/{}",
            subscription.share_name(),
            subscription.topic_filter()
        ),
        "$share/groupA/sport/tennis"
    );
    assert_eq!(subscription.topic(), "$share/groupA/sport/tennis");
    assert_eq!(subscription.id(), 7);
    assert!(subscription.no_local());
    assert_eq!(subscription.retain_handling(), RetainHandling::DontSend);

    let store = SubscriptionStore::new();
    let result = store.subscribe("worker", [subscription.clone()]);
    assert_eq!(result[0].as_ref().unwrap().subscription, subscription);

    let matched = store
        .topic_matched("sport/tennis", SubscriptionType::SHARED)
        .unwrap();
    assert_eq!(matched["worker"], vec![subscription]);
}

#[test]
fn test_resubscribe_counts_once() {
    init_tracing();
    let store = SubscriptionStore::new();
    let subscription = Subscription::with_options(
        "sport/tennis",
        QoS::AtLeastOnce,
        SubscriptionOptions::new().with_share_name("g1"),
    );

    let first = store.subscribe("c1", [subscription.clone()]);
    assert!(!first[0].as_ref().unwrap().already_existed);
    let second = store.subscribe("c1", [subscription]);
    assert!(second[0].as_ref().unwrap().already_existed);

    let stats = store.get_stats();
    assert_eq!(stats.subscriptions_total, 1);
    assert_eq!(stats.subscriptions_current, 1);

    let client = store.get_client_stats("c1").unwrap();
    assert_eq!(client.subscriptions_total, 1);
    assert_eq!(client.subscriptions_current, 1);
}

#[test]
fn test_resubscribe_replaces_options() {
    let store = SubscriptionStore::new();
    store.subscribe("c1", [Subscription::new("a/b", QoS::AtMostOnce)]);
    store.subscribe(
        "c1",
        [Subscription::with_options(
            "a/b",
            QoS::ExactlyOnce,
            SubscriptionOptions::new().with_retain_as_published(true),
        )],
    );

    let subscriptions = store.client_subscriptions("c1", SubscriptionType::ALL);
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].qos(), QoS::ExactlyOnce);
    assert!(subscriptions[0].retain_as_published());
}

#[test]
fn test_unsubscribe_all_then_not_found() {
    let store = SubscriptionStore::new();
    store.subscribe(
        "c1",
        [
            Subscription::new("a/+", QoS::AtMostOnce),
            Subscription::new("b/#", QoS::AtLeastOnce),
        ],
    );
    assert!(store.get_client_stats("c1").is_ok());

    assert_eq!(store.unsubscribe_all("c1"), 2);
    assert_eq!(
        store.get_client_stats("c1"),
        Err(SubscriptionError::NotFound("c1".to_string()))
    );
    assert!(store
        .topic_matched("a/x", SubscriptionType::ALL)
        .unwrap()
        .is_empty());

    let stats = store.get_stats();
    assert_eq!(stats.subscriptions_total, 2);
    assert_eq!(stats.subscriptions_current, 0);
}

#[test]
fn test_shared_vs_all_type_filter() {
    let store = SubscriptionStore::new();
    store.subscribe(
        "c1",
        [
            Subscription::new("sport/tennis", QoS::AtMostOnce),
            Subscription::with_options(
                "sport/tennis",
                QoS::AtMostOnce,
                SubscriptionOptions::new().with_share_name("g1"),
            ),
        ],
    );

    let shared = collect(
        &store,
        &IterationOptions::new(SubscriptionType::SHARED).with_topic_name("sport/tennis"),
    );
    assert_eq!(
        shared,
        vec![("c1".to_string(), "$share/g1/sport/tennis".to_string())]
    );

    let all = collect(
        &store,
        &IterationOptions::new(SubscriptionType::ALL).with_topic_name("sport/tennis"),
    );
    assert_eq!(
        all,
        vec![
            ("c1".to_string(), "$share/g1/sport/tennis".to_string()),
            ("c1".to_string(), "sport/tennis".to_string()),
        ]
    );

    let non_shared = collect(
        &store,
        &IterationOptions::new(SubscriptionType::NON_SHARED).with_client_id("c1"),
    );
    assert_eq!(
        non_shared,
        vec![("c1".to_string(), "sport/tennis".to_string())]
    );
}

#[test]
fn test_system_type_filter() {
    let store = SubscriptionStore::new();
    store.subscribe(
        "monitor",
        [
            Subscription::new("$SYS/broker/#", QoS::AtMostOnce),
            Subscription::new("broker/#", QoS::AtMostOnce),
        ],
    );

    let system = store.client_subscriptions("monitor", SubscriptionType::SYS);
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].topic_filter(), "$SYS/broker/#");

    let both = store.client_subscriptions(
        "monitor",
        SubscriptionType::SYS | SubscriptionType::NON_SHARED,
    );
    assert_eq!(both.len(), 2);
}

#[test]
fn test_match_name_lookup() {
    let store = SubscriptionStore::new();
    store.subscribe("c1", [Subscription::new("sport/+", QoS::AtMostOnce)]);
    store.subscribe("c2", [Subscription::new("sport/tennis", QoS::AtMostOnce)]);

    let exact = collect(
        &store,
        &IterationOptions::new(SubscriptionType::ALL)
            .with_topic_name("sport/+")
            .with_match_type(MatchType::MatchName),
    );
    assert_eq!(exact, vec![("c1".to_string(), "sport/+".to_string())]);

    let filtered = collect(
        &store,
        &IterationOptions::new(SubscriptionType::ALL).with_topic_name("sport/tennis"),
    );
    assert_eq!(filtered.len(), 2);
}

#[test]
fn test_unsubscribe_by_filter_string() {
    let store = SubscriptionStore::new();
    store.subscribe(
        "c1",
        [
            Subscription::new("a/b", QoS::AtMostOnce),
            Subscription::new("a/c", QoS::AtMostOnce),
        ],
    );

    assert_eq!(store.unsubscribe("c1", ["a/b", "not/there"]), 1);
    assert_eq!(
        store
            .client_subscriptions("c1", SubscriptionType::ALL)
            .iter()
            .map(Subscription::topic_filter)
            .collect::<Vec<_>>(),
        vec!["a/c"]
    );

    let client = store.get_client_stats("c1").unwrap();
    assert_eq!(client.subscriptions_total, 2);
    assert_eq!(client.subscriptions_current, 1);
}

#[test]
fn test_concurrent_subscribe_and_iterate() {
    init_tracing();
    const WRITERS: usize = 8;
    const FILTERS_PER_WRITER: usize = 25;
    const READERS: usize = 4;
    const TOTAL: usize = WRITERS * FILTERS_PER_WRITER;

    let store = Arc::new(SubscriptionStore::new());

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                for i in 0..FILTERS_PER_WRITER {
                    let filter = format!("load/{writer}/{i}");
                    let results =
                        store.subscribe("client", [Subscription::new(filter, QoS::AtLeastOnce)]);
                    assert!(!results[0].as_ref().unwrap().already_existed);
                }
            });
        }

        for _ in 0..READERS {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                let options = IterationOptions::new(SubscriptionType::ALL).with_client_id("client");
                for _ in 0..50 {
                    let mut seen = 0usize;
                    store
                        .iterate(
                            |client_id, subscription| {
                                assert_eq!(client_id, "client");
                                assert!(subscription.topic_filter().starts_with("load/"));
                                assert_eq!(subscription.qos(), QoS::AtLeastOnce);
                                seen += 1;
                                true
                            },
                            &options,
                        )
                        .unwrap();
                    assert!(seen <= TOTAL);
                }
            });
        }
    });

    let stats = store.get_stats();
    assert_eq!(stats.subscriptions_current, TOTAL as u64);
    assert_eq!(stats.subscriptions_total, TOTAL as u64);
    assert_eq!(
        store.get_client_stats("client").unwrap().subscriptions_current,
        TOTAL as u64
    );
    assert_eq!(
        store
            .client_subscriptions("client", SubscriptionType::ALL)
            .len(),
        TOTAL
    );
}

#[test]
fn test_concurrent_subscribe_unsubscribe_keeps_counters_consistent() {
    let store = Arc::new(SubscriptionStore::new());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                let client_id = format!("client-{worker}");
                for i in 0..50 {
                    let filter = format!("churn/{i}/#");
                    store.subscribe(&client_id, [Subscription::new(filter.as_str(), QoS::AtMostOnce)]);
                    if i % 2 == 0 {
                        assert_eq!(store.unsubscribe(&client_id, [filter]), 1);
                    }
                }
            });
        }
    });

    let stats = store.get_stats();
    assert_eq!(stats.subscriptions_total, 200);
    assert_eq!(stats.subscriptions_current, 100);

    let matched = store
        .topic_matched("churn/1/x", SubscriptionType::ALL)
        .unwrap();
    assert_eq!(matched.len(), 4);
    assert!(store
        .topic_matched("churn/0/x", SubscriptionType::ALL)
        .unwrap()
        .is_empty());
}
