use super::*;
use crate::channel::Broker;
use crate::clock::ManualClock;
use crate::table::TumblingWindowTable;

const SIZE: Duration = Duration::from_secs(10);
const GRACE: Duration = Duration::from_secs(5);

fn table(clock: &Arc<ManualClock>) -> SharedTable<String, u64> {
    SharedTable::new(TumblingWindowTable::new("word-counts", SIZE, GRACE, clock.clone()).unwrap())
}

fn message(text: &[u8], timestamp: i64, offset: u64) -> Message {
    Message {
        key: None,
        value: text.to_vec(),
        timestamp,
        partition: 0,
        offset,
    }
}

fn rows(pairs: &[(&str, u64)]) -> Vec<CountRow> {
    pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

#[test]
fn test_word_tokenizer_lowercases_and_splits() {
    let tokens = WordTokenizer.tokenize("Hello, world!  HEY_there no-yes 42");
    assert_eq!(tokens, vec!["hello", "world", "hey_there", "no", "yes", "42"]);
}

#[test]
fn test_word_tokenizer_empty_and_punctuation_only() {
    assert!(WordTokenizer.tokenize("").is_empty());
    assert!(WordTokenizer.tokenize(" ,.;!? ").is_empty());
}

#[test]
fn test_word_tokenizer_unicode_words() {
    assert_eq!(WordTokenizer.tokenize("Größe café"), vec!["größe", "café"]);
}

// ── Snapshot policy ───────────────────────────────────────────────────────────

#[test]
fn test_snapshot_policy_parse_and_display() {
    for (text, policy) in [
        ("every_message", SnapshotPolicy::EveryMessage),
        ("never", SnapshotPolicy::Never),
        ("every:3", SnapshotPolicy::EveryN(3)),
        ("interval:500", SnapshotPolicy::IntervalMs(500)),
    ] {
        assert_eq!(text.parse::<SnapshotPolicy>().unwrap(), policy);
        assert_eq!(policy.to_string(), text);
    }
}

#[test]
fn test_snapshot_policy_rejects_garbage() {
    for text in ["", "sometimes", "every:0", "every:x", "interval:", "hourly:5"] {
        let err = text.parse::<SnapshotPolicy>().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "{text:?} should be rejected");
    }
}

#[test]
fn test_snapshot_gate_every_n() {
    let mut gate = SnapshotGate::new(SnapshotPolicy::EveryN(3));
    let now = Instant::now();
    let emitted: Vec<bool> = (0..6).map(|_| gate.record(now)).collect();
    assert_eq!(emitted, vec![false, false, true, false, false, true]);
}

#[test]
fn test_snapshot_gate_interval() {
    let mut gate = SnapshotGate::new(SnapshotPolicy::IntervalMs(1_000));
    let start = Instant::now();
    assert!(gate.record(start));
    assert!(!gate.record(start + Duration::from_millis(999)));
    assert!(gate.record(start + Duration::from_millis(1_000)));
    assert!(!gate.record(start + Duration::from_millis(1_500)));
}

#[test]
fn test_snapshot_gate_never() {
    let mut gate = SnapshotGate::new(SnapshotPolicy::Never);
    assert!((0..10).all(|_| !gate.record(Instant::now())));
}

// ── Processing ────────────────────────────────────────────────────────────────

#[test]
fn test_process_counts_words_and_emits_snapshot() {
    let clock = Arc::new(ManualClock::new(0));
    let sink = MemorySink::new();
    let mut consumer = ConsumerLoop::new(table(&clock)).with_sink(sink.clone());

    assert_eq!(consumer.process(&message(b"hello world hello", 0, 0)).unwrap(), 3);
    assert_eq!(sink.last().unwrap(), rows(&[("hello", 2), ("world", 1)]));

    consumer.process(&message(b"Yes hello", 1_000, 1)).unwrap();
    assert_eq!(sink.last().unwrap(), rows(&[("hello", 3), ("world", 1), ("yes", 1)]));

    let report = consumer.report();
    assert_eq!(report.processed, 2);
    assert_eq!(report.tokens, 5);
    assert_eq!(report.snapshots, 2);
}

#[test]
fn test_process_skips_invalid_utf8() {
    let clock = Arc::new(ManualClock::new(0));
    let sink = MemorySink::new();
    let shared = table(&clock);
    let mut consumer = ConsumerLoop::new(shared.clone()).with_sink(sink.clone());

    let err = consumer.process(&message(&[0xff, 0xfe, b'h'], 0, 7)).unwrap_err();
    assert!(matches!(err, Error::Decode { offset: 7, .. }));
    assert!(shared.items().is_empty());
    assert!(sink.is_empty());
    assert_eq!(consumer.report().decode_errors, 1);
    assert_eq!(consumer.report().processed, 0);

    consumer.process(&message(b"hello", 0, 8)).unwrap();
    assert_eq!(shared.get("hello"), 1);
}

#[test]
fn test_process_counts_stale_tokens() {
    let clock = Arc::new(ManualClock::new(0));
    let mut consumer = ConsumerLoop::new(table(&clock)).with_sink(MemorySink::new());

    consumer.process(&message(b"hello", 30_000, 0)).unwrap();
    // Window 0 expired long ago relative to t=30s.
    consumer.process(&message(b"late words", 1_000, 1)).unwrap();
    assert_eq!(consumer.report().stale_writes, 2);
    assert_eq!(consumer.report().processed, 2);
}

#[test]
fn test_process_respects_policy() {
    let clock = Arc::new(ManualClock::new(0));
    let sink = MemorySink::new();
    let mut consumer = ConsumerLoop::new(table(&clock))
        .with_sink(sink.clone())
        .with_policy(SnapshotPolicy::EveryN(2));
    for offset in 0..5 {
        consumer.process(&message(b"hey", 0, offset)).unwrap();
    }
    assert_eq!(sink.len(), 2);
    assert_eq!(sink.last().unwrap(), rows(&[("hey", 4)]));
}

#[test]
fn test_custom_tokenizer() {
    struct Whitespace;
    impl Tokenizer for Whitespace {
        fn tokenize(&self, text: &str) -> Vec<String> {
            text.split_whitespace().map(String::from).collect()
        }
    }

    let clock = Arc::new(ManualClock::new(0));
    let shared = table(&clock);
    let mut consumer = ConsumerLoop::new(shared.clone())
        .with_tokenizer(Whitespace)
        .with_sink(MemorySink::new());
    consumer.process(&message(b"Hello, hello", 0, 0)).unwrap();
    assert_eq!(shared.get("Hello,"), 1);
    assert_eq!(shared.get("hello"), 1);
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_drains_enqueued_messages_on_shutdown() {
    let clock = Arc::new(ManualClock::new(1_000));
    let broker = Broker::connect_with_clock("memory://consumer", clock.clone()).unwrap();
    let topic = broker.create_topic("hello-topic", 2).unwrap();
    let subscription = topic.subscribe().unwrap();

    let shared = table(&clock);
    let sink = MemorySink::new();
    let (stop_tx, stop_rx) = watch::channel(false);
    // Stop before the loop starts so everything is picked up by the drain.
    stop_tx.send(true).unwrap();

    for text in ["hello world", "hello", "no"] {
        topic.send(None, text.as_bytes().to_vec()).await.unwrap();
    }

    let report = ConsumerLoop::new(shared.clone())
        .with_sink(sink.clone())
        .run(subscription, stop_rx)
        .await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.drained, 3);
    assert_eq!(shared.get("hello"), 2);
    assert_eq!(shared.get("world"), 1);
    assert_eq!(shared.get("no"), 1);
    assert!(topic.is_closed());
    assert!(topic.send(None, b"after".to_vec()).await.is_err());
}

#[tokio::test]
async fn test_run_processes_live_messages_then_stops() {
    let clock = Arc::new(ManualClock::new(0));
    let broker = Broker::connect_with_clock("memory://consumer", clock.clone()).unwrap();
    let topic = broker.create_topic("hello-topic", 1).unwrap();
    let subscription = topic.subscribe().unwrap();

    let shared = table(&clock);
    let sink = MemorySink::new();
    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = ConsumerLoop::new(shared.clone())
        .with_sink(sink.clone())
        .spawn(subscription, stop_rx);

    topic.send(None, b"hello world hello".to_vec()).await.unwrap();
    while sink.is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(sink.last().unwrap(), rows(&[("hello", 2), ("world", 1)]));

    stop_tx.send(true).unwrap();
    let report = handle.await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.drained, 0);
    assert_eq!(report.snapshots, 1);
}

#[tokio::test]
async fn test_run_stops_when_shutdown_sender_dropped() {
    let clock = Arc::new(ManualClock::new(0));
    let broker = Broker::connect_with_clock("memory://consumer", clock.clone()).unwrap();
    let topic = broker.create_topic("t", 1).unwrap();
    let subscription = topic.subscribe().unwrap();

    let (stop_tx, stop_rx) = watch::channel(false);
    drop(stop_tx);
    let report = ConsumerLoop::new(table(&clock))
        .with_sink(MemorySink::new())
        .run(subscription, stop_rx)
        .await;
    assert_eq!(report, ConsumerReport::default());
}
