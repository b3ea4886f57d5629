use super::*;
use crate::clock::ManualClock;

fn broker() -> Broker {
    Broker::connect_with_clock("memory://test", Arc::new(ManualClock::new(42))).unwrap()
}

fn text(message: &Message) -> &str {
    std::str::from_utf8(&message.value).unwrap()
}

// ── Broker ────────────────────────────────────────────────────────────────────

#[test]
fn test_connect_rejects_unknown_scheme() {
    let err = Broker::connect("kafka://localhost:9092").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = Broker::connect("memory://").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    assert_eq!(Broker::connect("memory://local").unwrap().address(), "memory://local");
}

#[test]
fn test_create_topic_is_idempotent() {
    let broker = broker();
    let first = broker.create_topic("hello-topic", 2).unwrap();
    let second = broker.create_topic("hello-topic", 2).unwrap();
    assert_eq!(first.name(), second.name());
    assert_eq!(broker.topic_names(), vec!["hello-topic".to_string()]);

    // Both handles share one log: the subscription taken through one is seen by the other.
    let _sub = first.subscribe().unwrap();
    assert!(second.subscribe().is_err());
}

#[test]
fn test_create_topic_rejects_partition_mismatch_and_zero() {
    let broker = broker();
    broker.create_topic("t", 2).unwrap();
    let err = broker.create_topic("t", 3).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = broker.create_topic("empty", 0).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(broker.topic("empty").is_none());
}

#[test]
fn test_zero_capacity_rejected() {
    let broker = broker().with_capacity(0);
    assert!(matches!(
        broker.create_topic("t", 1).unwrap_err(),
        Error::Configuration(_)
    ));
}

#[test]
fn test_single_subscriber_per_topic() {
    let broker = broker();
    broker.create_topic("t", 1).unwrap();
    let _sub = broker.subscribe("t").unwrap();
    let err = broker.subscribe("t").unwrap_err();
    assert!(matches!(err, Error::TransportUnavailable(_)));
    assert!(err.to_string().contains("already has a subscriber"));
}

#[test]
fn test_subscribe_missing_topic() {
    let err = broker().subscribe("nope").unwrap_err();
    assert!(matches!(err, Error::TransportUnavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_with_retry_waits_for_topic() {
    let broker = Arc::new(broker());
    let creator = {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            broker.create_topic("late", 1).unwrap();
        })
    };

    let sub = broker
        .subscribe_with_retry("late", 5, Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(sub.topic(), "late");
    creator.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_with_retry_gives_up() {
    let broker = broker();
    let err = broker
        .subscribe_with_retry("never", 3, Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransportUnavailable(_)));
}

// ── Send / receive ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_stamps_metadata() {
    let broker = broker();
    let topic = broker.create_topic("t", 1).unwrap();
    let mut sub = topic.subscribe().unwrap();

    let meta = topic.send(None, b"hello".to_vec()).await.unwrap();
    assert_eq!(meta.topic, "t");
    assert_eq!(meta.partition, 0);
    assert_eq!(meta.offset, 0);
    assert_eq!(meta.timestamp, 42);

    let message = sub.recv().await.unwrap();
    assert_eq!(text(&message), "hello");
    assert_eq!(message.timestamp, 42);
    assert!(!message.is_keyed());
    assert_eq!(sub.delivered(), 1);
}

#[tokio::test]
async fn test_same_key_same_partition_in_order() {
    let broker = broker();
    let topic = broker.create_topic("t", 4).unwrap();
    let mut sub = topic.subscribe().unwrap();

    for i in 0..20 {
        topic
            .send(Some(b"user-1".to_vec()), format!("{i}").into_bytes())
            .await
            .unwrap();
    }

    let mut partition = None;
    for i in 0..20u64 {
        let message = sub.recv().await.unwrap();
        assert_eq!(*partition.get_or_insert(message.partition), message.partition);
        assert_eq!(message.offset, i);
        assert_eq!(text(&message), i.to_string());
    }
}

#[tokio::test]
async fn test_unkeyed_messages_rotate_partitions() {
    let broker = broker();
    let topic = broker.create_topic("t", 3).unwrap();
    let _sub = topic.subscribe().unwrap();

    let mut partitions = Vec::new();
    for _ in 0..3 {
        partitions.push(topic.send(None, b"x".to_vec()).await.unwrap().partition);
    }
    assert_eq!(partitions, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_try_send_reports_full_partition() {
    let broker = broker().with_capacity(2);
    let topic = broker.create_topic("t", 1).unwrap();
    let mut sub = topic.subscribe().unwrap();

    topic.try_send(None, b"a".to_vec()).unwrap();
    topic.try_send(None, b"b".to_vec()).unwrap();
    let err = topic.try_send(None, b"c".to_vec()).unwrap_err();
    assert!(matches!(err, Error::TransportUnavailable(_)));
    assert!(err.to_string().contains("full"));

    // Freeing a slot lets the next send through with the next offset.
    assert_eq!(text(&sub.recv().await.unwrap()), "a");
    let meta = topic.try_send(None, b"c".to_vec()).unwrap();
    assert_eq!(meta.offset, 2);
}

#[tokio::test]
async fn test_send_suspends_when_full() {
    let broker = broker().with_capacity(1);
    let topic = broker.create_topic("t", 1).unwrap();
    let mut sub = topic.subscribe().unwrap();

    topic.send(None, b"first".to_vec()).await.unwrap();
    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        topic.send(None, b"second".to_vec()),
    )
    .await;
    assert!(blocked.is_err(), "send should wait for room");

    let pending = {
        let topic = topic.clone();
        tokio::spawn(async move { topic.send(None, b"second".to_vec()).await })
    };
    assert_eq!(text(&sub.recv().await.unwrap()), "first");
    let meta = pending.await.unwrap().unwrap();
    assert_eq!(meta.offset, 1);
    assert_eq!(text(&sub.recv().await.unwrap()), "second");
}

// ── Cancellation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_rejects_sends_and_drains_buffer() {
    let broker = broker();
    let topic = broker.create_topic("t", 2).unwrap();
    let mut sub = topic.subscribe().unwrap();

    for word in ["one", "two", "three"] {
        topic.send(None, word.as_bytes().to_vec()).await.unwrap();
    }
    sub.cancel();
    assert!(sub.is_cancelled());
    assert!(topic.is_closed());

    let err = topic.send(None, b"four".to_vec()).await.unwrap_err();
    assert!(matches!(err, Error::TransportUnavailable(_)));
    assert!(topic.try_send(None, b"four".to_vec()).is_err());

    let mut seen = Vec::new();
    while let Some(message) = sub.recv().await {
        seen.push(text(&message).to_string());
    }
    seen.sort();
    assert_eq!(seen, vec!["one", "three", "two"]);
    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn test_drain_remaining_collects_enqueued() {
    let broker = broker();
    let topic = broker.create_topic("t", 1).unwrap();
    let mut sub = topic.subscribe().unwrap();

    topic.send(None, b"a".to_vec()).await.unwrap();
    topic.send(None, b"b".to_vec()).await.unwrap();
    assert_eq!(text(&sub.recv().await.unwrap()), "a");

    let rest = sub.drain_remaining().await;
    assert_eq!(rest.len(), 1);
    assert_eq!(text(&rest[0]), "b");
    assert_eq!(sub.delivered(), 2);
}

#[tokio::test]
async fn test_dropped_subscription_closes_topic() {
    let broker = broker();
    let topic = broker.create_topic("t", 1).unwrap();
    drop(topic.subscribe().unwrap());
    assert!(topic.is_closed());
    assert!(topic.send(None, b"x".to_vec()).await.is_err());
}

#[tokio::test]
async fn test_subscription_is_a_stream() {
    let broker = broker();
    let topic = broker.create_topic("t", 1).unwrap();
    let sub = topic.subscribe().unwrap();
    for i in 0..3 {
        topic.send(None, format!("m{i}").into_bytes()).await.unwrap();
    }

    let values: Vec<String> = sub
        .take(3)
        .map(|m| String::from_utf8(m.value).unwrap())
        .collect()
        .await;
    assert_eq!(values, vec!["m0", "m1", "m2"]);
}
