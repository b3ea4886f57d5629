//! Configuration loading: defaults, then the TOML file, then flags.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use tallycrab_core::app::AppConfig;
use tallycrab_core::consumer::SnapshotPolicy;

/// Layout of the `--config` file. Every key is optional.
///
/// ```toml
/// app_id = "hello-app"
///
/// [broker]
/// topic = "hello-topic"
/// address = "memory://local"
///
/// [table]
/// window_size_ms = 10000
/// expiry_grace_ms = 5000
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub app_id: Option<String>,
    pub broker: BrokerSection,
    pub table: TableSection,
    pub producer: ProducerSection,
    pub consumer: ConsumerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerSection {
    pub topic: Option<String>,
    pub address: Option<String>,
    pub partitions: Option<u32>,
    pub capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableSection {
    pub name: Option<String>,
    pub window_size_ms: Option<u64>,
    pub expiry_grace_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProducerSection {
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerSection {
    pub snapshot: Option<SnapshotPolicy>,
    pub subscribe_retries: Option<usize>,
    pub subscribe_retry_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply(self, config: &mut AppConfig) {
        set(&mut config.app_id, self.app_id);
        set(&mut config.topic_name, self.broker.topic);
        set(&mut config.broker_address, self.broker.address);
        set(&mut config.partitions, self.broker.partitions);
        set(&mut config.channel_capacity, self.broker.capacity);
        set(&mut config.table_name, self.table.name);
        set(&mut config.window_size_ms, self.table.window_size_ms);
        set(&mut config.expiry_grace_ms, self.table.expiry_grace_ms);
        set(&mut config.producer_interval_ms, self.producer.interval_ms);
        set(&mut config.snapshot, self.consumer.snapshot);
        set(&mut config.subscribe_retries, self.consumer.subscribe_retries);
        set(
            &mut config.subscribe_retry_delay_ms,
            self.consumer.subscribe_retry_delay_ms,
        );
    }
}

/// Command-line overrides; each one wins over the file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Topic the producer writes to and the consumer reads from.
    #[arg(long)]
    pub topic: Option<String>,
    /// Broker address (memory://<name>).
    #[arg(long)]
    pub broker: Option<String>,
    #[arg(long)]
    pub window_size_ms: Option<u64>,
    #[arg(long)]
    pub expiry_grace_ms: Option<u64>,
    /// Milliseconds between produced messages.
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// every_message, never, every:<n> or interval:<ms>.
    #[arg(long)]
    pub snapshot: Option<SnapshotPolicy>,
}

impl Overrides {
    pub fn apply(&self, config: &mut AppConfig) {
        set(&mut config.topic_name, self.topic.clone());
        set(&mut config.broker_address, self.broker.clone());
        set(&mut config.window_size_ms, self.window_size_ms);
        set(&mut config.expiry_grace_ms, self.expiry_grace_ms);
        set(&mut config.producer_interval_ms, self.interval_ms);
        set(&mut config.snapshot, self.snapshot);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Build the effective, validated configuration.
pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::default();
    if let Some(path) = path {
        FileConfig::load(path)?.apply(&mut config);
    }
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}
