use super::*;

/// Everything needed to build an [`App`]. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Application id, used in logs.
    pub app_id: String,
    pub topic_name: String,
    /// Only `memory://<name>` is available.
    pub broker_address: String,
    pub partitions: u32,
    /// Per-partition buffer size.
    pub channel_capacity: usize,
    pub table_name: String,
    pub window_size_ms: u64,
    pub expiry_grace_ms: u64,
    pub producer_interval_ms: u64,
    pub snapshot: SnapshotPolicy,
    pub subscribe_retries: usize,
    pub subscribe_retry_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: "hello-app".to_string(),
            topic_name: "hello-topic".to_string(),
            broker_address: "memory://local".to_string(),
            partitions: 1,
            channel_capacity: 1024,
            table_name: "word-counts".to_string(),
            window_size_ms: 10_000,
            expiry_grace_ms: 5_000,
            producer_interval_ms: 4_000,
            snapshot: SnapshotPolicy::EveryMessage,
            subscribe_retries: 5,
            subscribe_retry_delay_ms: 200,
        }
    }
}

impl AppConfig {
    /// Reject parameters the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.topic_name.trim().is_empty() {
            return Err(Error::configuration("topic_name must not be empty"));
        }
        if self.table_name.trim().is_empty() {
            return Err(Error::configuration("table_name must not be empty"));
        }
        if self.partitions == 0 {
            return Err(Error::configuration("partitions must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::configuration("channel_capacity must be at least 1"));
        }
        if self.window_size_ms == 0 {
            return Err(Error::configuration("window_size_ms must be positive"));
        }
        if self.producer_interval_ms == 0 {
            return Err(Error::configuration("producer_interval_ms must be positive"));
        }
        if self.subscribe_retries == 0 {
            return Err(Error::configuration("subscribe_retries must be at least 1"));
        }
        Ok(())
    }

    pub fn window_size(&self) -> Duration {
        Duration::from_millis(self.window_size_ms)
    }

    pub fn expiry_grace(&self) -> Duration {
        Duration::from_millis(self.expiry_grace_ms)
    }

    pub fn producer_interval(&self) -> Duration {
        Duration::from_millis(self.producer_interval_ms)
    }

    pub fn subscribe_retry_delay(&self) -> Duration {
        Duration::from_millis(self.subscribe_retry_delay_ms)
    }
}
