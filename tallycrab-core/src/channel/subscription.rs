use super::*;

/// Live view over every partition of a topic.
///
/// Messages from one partition arrive in send order; partitions are
/// interleaved with no global order. Once [`cancel`](Self::cancel)led, new
/// sends are rejected but everything already enqueued is still handed out
/// before the sequence ends.
pub struct Subscription {
    topic: String,
    streams: StreamMap<PartitionId, ReceiverStream<Message>>,
    closed: Arc<AtomicBool>,
    cancelled: bool,
    delivered: u64,
}

impl Subscription {
    pub(crate) fn new(
        topic: String,
        receivers: Vec<mpsc::Receiver<Message>>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        let mut streams = StreamMap::with_capacity(receivers.len());
        for (partition, receiver) in receivers.into_iter().enumerate() {
            streams.insert(partition as PartitionId, ReceiverStream::new(receiver));
        }
        Self {
            topic,
            streams,
            closed,
            cancelled: false,
            delivered: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message from any partition.
    ///
    /// Returns `None` once the subscription is cancelled and drained, or when
    /// the topic itself has been dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.next().await
    }

    /// Stop accepting new messages. Already-enqueued messages stay readable.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.closed.store(true, Ordering::SeqCst);
        for (_, stream) in self.streams.iter_mut() {
            stream.close();
        }
        info!(topic = %self.topic, delivered = self.delivered, "subscription cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of messages handed out so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Cancel, then collect every message that was still enqueued.
    pub async fn drain_remaining(&mut self) -> Vec<Message> {
        self.cancel();
        let mut remaining = Vec::new();
        while let Some(message) = self.recv().await {
            remaining.push(message);
        }
        if !remaining.is_empty() {
            debug!(topic = %self.topic, count = remaining.len(), "drained enqueued messages");
        }
        remaining
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        let this = self.get_mut();
        match Pin::new(&mut this.streams).poll_next(cx) {
            Poll::Ready(Some((_, message))) => {
                this.delivered += 1;
                Poll::Ready(Some(message))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("partitions", &self.streams.len())
            .field("cancelled", &self.cancelled)
            .field("delivered", &self.delivered)
            .finish()
    }
}
