use super::*;

/// Counters accumulated by a [`ConsumerLoop`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    /// Messages decoded and counted.
    pub processed: u64,
    /// Messages skipped because the payload was not valid text.
    pub decode_errors: u64,
    /// Tokens offered to the table.
    pub tokens: u64,
    /// Tokens the table dropped as too late for any live window.
    pub stale_writes: u64,
    pub snapshots: u64,
    /// Messages that were still enqueued at shutdown and processed while draining.
    pub drained: u64,
}

/// Word-count consumer: subscription in, table updates and snapshots out.
pub struct ConsumerLoop {
    table: SharedTable<String, u64>,
    tokenizer: Box<dyn Tokenizer>,
    sink: Box<dyn SnapshotSink>,
    gate: SnapshotGate,
    report: ConsumerReport,
}

impl ConsumerLoop {
    /// A loop with the word tokenizer, stdout snapshots after every message.
    pub fn new(table: SharedTable<String, u64>) -> Self {
        Self {
            table,
            tokenizer: Box::new(WordTokenizer),
            sink: Box::new(StdoutSink),
            gate: SnapshotGate::new(SnapshotPolicy::default()),
            report: ConsumerReport::default(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn with_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.gate = SnapshotGate::new(policy);
        self
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.gate.policy()
    }

    pub fn report(&self) -> &ConsumerReport {
        &self.report
    }

    /// Count the words of one message; returns how many tokens it carried.
    ///
    /// A payload that is not UTF-8 is counted as a decode error and leaves the
    /// table untouched.
    pub fn process(&mut self, message: &Message) -> Result<usize> {
        let record = TextRecord::decode(message).inspect_err(|_| {
            self.report.decode_errors += 1;
        })?;

        let tokens = self.tokenizer.tokenize(&record.text);
        let count = tokens.len();
        let at = message.timestamp;
        let stale = self.table.with(|table| {
            tokens
                .into_iter()
                .map(|token| table.increment_at(token, at))
                .filter(|outcome| !outcome.is_applied())
                .count()
        });

        self.report.processed += 1;
        self.report.tokens += count as u64;
        self.report.stale_writes += stale as u64;
        debug!(
            partition = message.partition,
            offset = message.offset,
            tokens = count,
            stale,
            "message counted"
        );

        if self.gate.record(Instant::now()) {
            self.emit_snapshot();
        }
        Ok(count)
    }

    fn emit_snapshot(&mut self) {
        let snapshot = self.table.items();
        self.sink.emit(&snapshot);
        self.report.snapshots += 1;
    }

    fn handle(&mut self, message: &Message) {
        if let Err(err) = self.process(message) {
            warn!(error = %err, "skipping message");
        }
    }

    /// Consume until `shutdown` flips to `true` (or its sender goes away),
    /// then cancel the subscription and process whatever was still enqueued.
    pub async fn run(
        mut self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> ConsumerReport {
        info!(
            topic = subscription.topic(),
            table = %self.table.name(),
            policy = %self.gate.policy(),
            "consumer started"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                message = subscription.recv() => match message {
                    Some(message) => self.handle(&message),
                    None => {
                        info!(topic = subscription.topic(), "subscription ended");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        let remaining = subscription.drain_remaining().await;
        for message in &remaining {
            self.handle(message);
        }
        self.report.drained = remaining.len() as u64;

        info!(
            processed = self.report.processed,
            decode_errors = self.report.decode_errors,
            stale_writes = self.report.stale_writes,
            drained = self.report.drained,
            "consumer stopped"
        );
        self.report
    }

    /// Run on a dedicated tokio task.
    pub fn spawn(
        self,
        subscription: Subscription,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<ConsumerReport> {
        tokio::spawn(self.run(subscription, shutdown))
    }
}

impl fmt::Debug for ConsumerLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerLoop")
            .field("table", &self.table)
            .field("gate", &self.gate)
            .field("report", &self.report)
            .finish()
    }
}
