use super::*;

/// Address scheme of the in-process transport.
pub const MEMORY_SCHEME: &str = "memory://";

/// Registry of topics: the in-process stand-in for a message broker.
pub struct Broker {
    address: String,
    clock: Arc<dyn Clock>,
    capacity: usize,
    topics: RwLock<HashMap<String, Topic>>,
}

impl Broker {
    /// Connect to `memory://<name>` using the system clock.
    pub fn connect(address: &str) -> Result<Self> {
        Self::connect_with_clock(address, Arc::new(SystemClock))
    }

    /// Connect with an explicit clock for arrival timestamps.
    ///
    /// Any address outside the `memory://` scheme is a configuration error.
    pub fn connect_with_clock(address: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let Some(name) = address.strip_prefix(MEMORY_SCHEME) else {
            return Err(Error::configuration(format!(
                "unsupported broker address {address:?}: expected {MEMORY_SCHEME}<name>"
            )));
        };
        if name.is_empty() {
            return Err(Error::configuration(format!(
                "broker address {address:?} has no name"
            )));
        }
        info!(address, "connected to in-process broker");
        Ok(Self {
            address: address.to_string(),
            clock,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            topics: RwLock::new(HashMap::new()),
        })
    }

    /// Per-partition capacity for topics created from now on.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Declare a topic. Re-declaring with the same partition count returns the
    /// existing topic; a different count is a configuration error.
    pub fn create_topic(&self, name: &str, partitions: u32) -> Result<Topic> {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = topics.get(name) {
            if existing.partition_count() != partitions {
                return Err(Error::configuration(format!(
                    "topic {name} already exists with {} partitions, requested {partitions}",
                    existing.partition_count()
                )));
            }
            return Ok(existing.clone());
        }

        let topic = Topic::new(name, partitions, self.capacity, Arc::clone(&self.clock))?;
        topics.insert(name.to_string(), topic.clone());
        info!(topic = name, partitions, capacity = self.capacity, "created topic");
        Ok(topic)
    }

    pub fn topic(&self, name: &str) -> Option<Topic> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn subscribe(&self, name: &str) -> Result<Subscription> {
        self.topic(name)
            .ok_or_else(|| Error::transport(format!("topic {name} does not exist")))?
            .subscribe()
    }

    /// Subscribe, retrying up to `attempts` times with `retry_delay` in between.
    pub async fn subscribe_with_retry(
        &self,
        name: &str,
        attempts: usize,
        retry_delay: Duration,
    ) -> Result<Subscription> {
        let attempts = attempts.max(1);
        let mut last_err: Option<Error> = None;
        for attempt in 1..=attempts {
            match self.subscribe(name) {
                Ok(subscription) => return Ok(subscription),
                Err(err) => {
                    warn!(topic = name, attempt, attempts, error = %err, "subscribe failed");
                    last_err = Some(err);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(retry_delay).await;
            }
        }
        Err(last_err.unwrap_or_else(|| Error::transport(format!("cannot subscribe to {name}"))))
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("address", &self.address)
            .field("capacity", &self.capacity)
            .field("topics", &self.topic_names())
            .finish()
    }
}
