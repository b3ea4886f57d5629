use super::*;

/// Pluggable edges of the pipeline.
pub struct Collaborators {
    pub source: Box<dyn TextSource>,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sink: Box<dyn SnapshotSink>,
}

impl Collaborators {
    pub fn with_source(mut self, source: impl TextSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn with_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }
}

impl Default for Collaborators {
    /// Random words in, word tokens, snapshots printed to stdout.
    fn default() -> Self {
        Self {
            source: Box::new(RandomWords::new()),
            tokenizer: Box::new(WordTokenizer),
            sink: Box::new(StdoutSink),
        }
    }
}

/// What the pipeline did between start and shutdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppReport {
    pub producer: ProducerReport,
    pub consumer: ConsumerReport,
    /// Table contents after the drain.
    pub final_counts: Vec<CountRow>,
}

/// The established pipeline, before any task runs.
pub struct App {
    config: AppConfig,
    broker: Arc<Broker>,
    topic: Topic,
    table: SharedTable<String, u64>,
    state: StateCell,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Connect the broker, declare the topic and build the table.
    ///
    /// Any failure here is a configuration error and nothing is left running.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = StateCell::new();
        config.validate()?;
        info!(
            app = %config.app_id,
            broker = %config.broker_address,
            topic = %config.topic_name,
            "starting"
        );

        let broker = Broker::connect_with_clock(&config.broker_address, Arc::clone(&clock))?
            .with_capacity(config.channel_capacity);
        let topic = broker.create_topic(&config.topic_name, config.partitions)?;
        let table = SharedTable::new(TumblingWindowTable::new(
            config.table_name.clone(),
            config.window_size(),
            config.expiry_grace(),
            clock,
        )?);

        Ok(Self {
            config,
            broker: Arc::new(broker),
            topic,
            table,
            state,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn table(&self) -> &SharedTable<String, u64> {
        &self.table
    }

    pub fn state(&self) -> AppState {
        self.state.get()
    }

    pub fn watch_state(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Spawn the consumer and producer tasks and move to `Running`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start(self, collaborators: Collaborators) -> Result<RunningApp> {
        let Collaborators {
            source,
            tokenizer,
            sink,
        } = collaborators;

        let producer_timer =
            ProducerTimer::new(self.topic.clone(), source, self.config.producer_interval())?;
        let consumer_loop = ConsumerLoop::new(self.table.clone())
            .with_tokenizer(tokenizer)
            .with_sink(sink)
            .with_policy(self.config.snapshot);

        let (consumer_stop, consumer_stop_rx) = watch::channel(false);
        let (consumer_done_tx, consumer_done) = watch::channel(false);
        let consumer = {
            let broker = Arc::clone(&self.broker);
            let state = self.state.clone();
            let topic = self.config.topic_name.clone();
            let retries = self.config.subscribe_retries;
            let retry_delay = self.config.subscribe_retry_delay();
            tokio::spawn(async move {
                let result = match broker.subscribe_with_retry(&topic, retries, retry_delay).await {
                    Ok(subscription) => Ok(consumer_loop.run(subscription, consumer_stop_rx).await),
                    Err(err) => {
                        error!(topic = %topic, error = %err, "consumer could not subscribe");
                        state.advance(AppState::Stopped);
                        Err(err)
                    }
                };
                let _ = consumer_done_tx.send(true);
                result
            })
        };

        let (producer_stop, producer_stop_rx) = watch::channel(false);
        let producer = producer_timer.spawn(producer_stop_rx);

        self.state.advance(AppState::Running);
        Ok(RunningApp {
            table: self.table,
            state: self.state,
            producer_stop,
            consumer_stop,
            consumer_done,
            producer,
            consumer,
        })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to a started pipeline.
pub struct RunningApp {
    table: SharedTable<String, u64>,
    state: StateCell,
    producer_stop: watch::Sender<bool>,
    consumer_stop: watch::Sender<bool>,
    consumer_done: watch::Receiver<bool>,
    producer: JoinHandle<ProducerReport>,
    consumer: JoinHandle<Result<ConsumerReport>>,
}

impl RunningApp {
    pub fn state(&self) -> AppState {
        self.state.get()
    }

    pub fn watch_state(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn table(&self) -> &SharedTable<String, u64> {
        &self.table
    }

    /// Resolves once the consumer task has ended on its own, which only
    /// happens when it could not subscribe. Callers should then shut down.
    pub async fn wait_for_stop_request(&mut self) {
        let _ = self.consumer_done.wait_for(|done| *done).await;
    }

    /// Stop the producer, drain the consumer and move to `Stopped`.
    ///
    /// Returns an error if the consumer never got its subscription or a task
    /// panicked; the state is `Stopped` either way.
    pub async fn shutdown(self) -> anyhow::Result<AppReport> {
        self.state.advance(AppState::Draining);

        let _ = self.producer_stop.send(true);
        let producer = self.producer.await;
        let _ = self.consumer_stop.send(true);
        let consumer = self.consumer.await;
        self.state.advance(AppState::Stopped);

        let producer = producer.context("producer task failed")?;
        let consumer = consumer
            .context("consumer task failed")?
            .map_err(|err| anyhow!(err).context("consumer could not subscribe"))?;

        let report = AppReport {
            producer,
            consumer,
            final_counts: self.table.items(),
        };
        info!(
            sent = report.producer.sent,
            processed = report.consumer.processed,
            words = report.final_counts.len(),
            "app stopped"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for RunningApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningApp")
            .field("state", &self.state())
            .finish()
    }
}
