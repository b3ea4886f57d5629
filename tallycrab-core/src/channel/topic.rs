use super::*;

struct PartitionLog {
    sender: mpsc::Sender<Message>,
    /// Held across the send so offsets follow delivery order.
    next_offset: AsyncMutex<Offset>,
}

struct TopicInner {
    name: String,
    capacity: usize,
    partitions: Vec<PartitionLog>,
    partitioner: Box<dyn Partitioner>,
    clock: Arc<dyn Clock>,
    /// Taken by the one and only subscriber.
    receivers: std::sync::Mutex<Option<Vec<mpsc::Receiver<Message>>>>,
    closed: Arc<AtomicBool>,
}

/// A named, partitioned message log. Cheap to clone; clones share the log.
#[derive(Clone)]
pub struct Topic {
    inner: Arc<TopicInner>,
}

impl Topic {
    /// Create a topic that routes keyed messages by hash and the rest round-robin.
    pub fn new(
        name: impl Into<String>,
        partitions: u32,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::with_partitioner(name, partitions, capacity, clock, DefaultPartitioner::new())
    }

    pub fn with_partitioner(
        name: impl Into<String>,
        partitions: u32,
        capacity: usize,
        clock: Arc<dyn Clock>,
        partitioner: impl Partitioner + 'static,
    ) -> Result<Self> {
        let name = name.into();
        if partitions == 0 {
            return Err(Error::configuration(format!(
                "topic {name} needs at least one partition"
            )));
        }
        if capacity == 0 {
            return Err(Error::configuration(format!(
                "topic {name} needs a channel capacity of at least 1"
            )));
        }

        let mut logs = Vec::with_capacity(partitions as usize);
        let mut receivers = Vec::with_capacity(partitions as usize);
        for _ in 0..partitions {
            let (sender, receiver) = mpsc::channel(capacity);
            logs.push(PartitionLog {
                sender,
                next_offset: AsyncMutex::new(0),
            });
            receivers.push(receiver);
        }

        Ok(Self {
            inner: Arc::new(TopicInner {
                name,
                capacity,
                partitions: logs,
                partitioner: Box::new(partitioner),
                clock,
                receivers: std::sync::Mutex::new(Some(receivers)),
                closed: Arc::new(AtomicBool::new(false)),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn partition_count(&self) -> u32 {
        self.inner.partitions.len() as u32
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// True once the subscription has been cancelled or dropped.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Append a message, suspending while the target partition is full.
    pub async fn send(&self, key: Option<Vec<u8>>, value: Vec<u8>) -> Result<RecordMetadata> {
        self.ensure_open()?;
        let partition = self.route(key.as_deref());
        let log = &self.inner.partitions[partition as usize];

        let mut next_offset = log.next_offset.lock().await;
        let message = self.stamp(key, value, partition, *next_offset);
        let metadata = self.metadata(&message);
        log.sender
            .send(message)
            .await
            .map_err(|_| self.closed_error())?;
        *next_offset += 1;

        debug!(topic = %self.inner.name, partition, offset = metadata.offset, "message enqueued");
        Ok(metadata)
    }

    /// Append a message without waiting; a full partition is reported as unavailable.
    pub fn try_send(&self, key: Option<Vec<u8>>, value: Vec<u8>) -> Result<RecordMetadata> {
        self.ensure_open()?;
        let partition = self.route(key.as_deref());
        let log = &self.inner.partitions[partition as usize];

        let mut next_offset = log.next_offset.try_lock().map_err(|_| {
            Error::transport(format!(
                "partition {}/{partition} has a send in flight",
                self.inner.name
            ))
        })?;
        let message = self.stamp(key, value, partition, *next_offset);
        let metadata = self.metadata(&message);
        match log.sender.try_send(message) {
            Ok(()) => {
                *next_offset += 1;
                Ok(metadata)
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(Error::transport(format!(
                "partition {}/{partition} is full",
                self.inner.name
            ))),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(self.closed_error()),
        }
    }

    /// Take the topic's single subscription.
    pub fn subscribe(&self) -> Result<Subscription> {
        let receivers = self
            .inner
            .receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| {
                Error::transport(format!(
                    "topic {} already has a subscriber",
                    self.inner.name
                ))
            })?;
        info!(topic = %self.inner.name, partitions = receivers.len(), "subscribed");
        Ok(Subscription::new(
            self.inner.name.clone(),
            receivers,
            Arc::clone(&self.inner.closed),
        ))
    }

    fn route(&self, key: Option<&[u8]>) -> PartitionId {
        let count = self.partition_count();
        self.inner.partitioner.partition(key, count) % count
    }

    fn stamp(
        &self,
        key: Option<Vec<u8>>,
        value: Vec<u8>,
        partition: PartitionId,
        offset: Offset,
    ) -> Message {
        Message {
            key,
            value,
            timestamp: self.inner.clock.now(),
            partition,
            offset,
        }
    }

    fn metadata(&self, message: &Message) -> RecordMetadata {
        RecordMetadata {
            topic: self.inner.name.clone(),
            partition: message.partition,
            offset: message.offset,
            timestamp: message.timestamp,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    fn closed_error(&self) -> Error {
        Error::transport(format!("topic {} is closed", self.inner.name))
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.inner.name)
            .field("partitions", &self.partition_count())
            .field("capacity", &self.inner.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}
