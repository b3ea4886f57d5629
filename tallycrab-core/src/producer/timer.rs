use super::*;

/// Counters accumulated by a [`ProducerTimer`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerReport {
    pub ticks: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Sends one generated message per period.
///
/// The first tick fires one full period after [`run`](Self::run) starts.
/// A failed send is logged and the timer keeps going.
pub struct ProducerTimer {
    topic: Topic,
    source: Box<dyn TextSource>,
    interval: Duration,
    key: Option<Vec<u8>>,
    report: ProducerReport,
}

impl ProducerTimer {
    pub fn new(topic: Topic, source: impl TextSource + 'static, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::configuration("producer interval must be positive"));
        }
        Ok(Self {
            topic,
            source: Box::new(source),
            interval,
            key: None,
            report: ProducerReport::default(),
        })
    }

    /// Route every message by `key` instead of round-robin.
    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn report(&self) -> &ProducerReport {
        &self.report
    }

    /// Generate and send a single message.
    pub async fn tick(&mut self) -> Result<RecordMetadata> {
        self.report.ticks += 1;
        let record = TextRecord::new(self.source.generate_text());
        match self.topic.send(self.key.clone(), record.encode()).await {
            Ok(metadata) => {
                self.report.sent += 1;
                debug!(
                    topic = %metadata.topic,
                    partition = metadata.partition,
                    offset = metadata.offset,
                    text = %record.text,
                    "message sent"
                );
                Ok(metadata)
            }
            Err(err) => {
                self.report.failed += 1;
                warn!(topic = self.topic.name(), error = %err, "send failed");
                Err(err)
            }
        }
    }

    /// Tick until `shutdown` flips to `true` (or its sender goes away).
    ///
    /// A send blocked on a full partition is abandoned when shutdown arrives.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> ProducerReport {
        info!(
            topic = self.topic.name(),
            interval_ms = self.interval.as_millis() as u64,
            "producer started"
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.tick() => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            ticks = self.report.ticks,
            sent = self.report.sent,
            failed = self.report.failed,
            "producer stopped"
        );
        self.report
    }

    /// Run on a dedicated tokio task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<ProducerReport> {
        tokio::spawn(self.run(shutdown))
    }
}

impl std::fmt::Debug for ProducerTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerTimer")
            .field("topic", &self.topic.name())
            .field("interval", &self.interval)
            .field("report", &self.report)
            .finish()
    }
}
