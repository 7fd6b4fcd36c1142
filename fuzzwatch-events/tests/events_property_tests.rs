//! Property-based tests for bus delivery and cross-tab signalling

use fuzzwatch_core::TabId;
use fuzzwatch_events::{BusMessage, CrossTabChannel, EventBus, StorageChange, Topic};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

fn any_topic() -> impl Strategy<Value = Topic> {
    prop::sample::select(Topic::all().to_vec())
}

fn message_for(topic: Topic) -> BusMessage {
    match topic {
        Topic::Storage => BusMessage::storage_any(),
        Topic::DomainListUpdated => BusMessage::DomainListUpdated,
        Topic::SchedulesUpdated => BusMessage::SchedulesUpdated,
        Topic::UserUpdated => BusMessage::UserUpdated,
        Topic::SidebarLayoutChanged => BusMessage::SidebarLayoutChanged { enabled: true },
        Topic::SidebarToggled => BusMessage::SidebarToggled { expanded: false },
        Topic::ContentPaddingChanged => BusMessage::ContentPaddingChanged { left: 16, right: 0 },
        Topic::ThemeChanged => BusMessage::ThemeChanged {
            theme: fuzzwatch_core::Theme::Dark,
        },
    }
}

proptest! {
    /// Every live subscriber of a topic sees each publish exactly once, in
    /// subscription order; dropped subscribers see nothing.
    #[test]
    fn prop_delivery_is_ordered_and_respects_unsubscribe(
        topic in any_topic(),
        keep in prop::collection::vec(any::<bool>(), 1..12),
        publishes in 1usize..5,
    ) {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut live = Vec::new();

        for (index, kept) in keep.iter().enumerate() {
            let sink = Arc::clone(&log);
            let sub = bus.subscribe(topic, move |_| sink.lock().unwrap().push(index));
            if *kept {
                live.push(sub);
            }
        }

        for _ in 0..publishes {
            bus.publish(message_for(topic));
        }

        let expected_once: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, kept)| **kept)
            .map(|(index, _)| index)
            .collect();
        let expected: Vec<usize> = expected_once
            .iter()
            .copied()
            .cycle()
            .take(expected_once.len() * publishes)
            .collect();

        prop_assert_eq!(log.lock().unwrap().clone(), expected);
        prop_assert_eq!(bus.subscriber_count(topic), live.len());
    }

    /// A message never reaches subscribers of a different topic.
    #[test]
    fn prop_topics_are_isolated(published in any_topic(), subscribed in any_topic()) {
        prop_assume!(published != subscribed);
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&hits);
        let _sub = bus.subscribe(subscribed, move |_| *sink.lock().unwrap() += 1);

        bus.publish(message_for(published));
        prop_assert_eq!(*hits.lock().unwrap(), 0);
    }

    /// Every tab except the writer receives each signalled key.
    #[test]
    fn prop_cross_tab_reaches_every_other_tab(tabs in 2usize..6, writes in 1usize..8) {
        let channel = CrossTabChannel::new(64);
        let ids: Vec<TabId> = (0..tabs).map(|_| TabId::new()).collect();
        let mut listeners = Vec::new();
        let mut logs = Vec::new();
        let mut subs = Vec::new();

        for id in &ids {
            let bus = EventBus::new();
            let log = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&log);
            subs.push(bus.subscribe(Topic::Storage, move |msg| {
                if let BusMessage::Storage(change) = msg {
                    sink.lock().unwrap().push(change.key.clone());
                }
            }));
            listeners.push(channel.attach(*id, bus));
            logs.push(log);
        }

        for n in 0..writes {
            channel.signal(StorageChange::for_key(format!("key-{}", n), ids[0]));
        }
        for listener in &mut listeners {
            listener.pump();
        }

        prop_assert!(logs[0].lock().unwrap().is_empty());
        for log in &logs[1..] {
            prop_assert_eq!(log.lock().unwrap().len(), writes);
        }
    }
}
