//! # In-process pub/sub
//!
//! A [`Broker`] owns named [`Topic`]s. Each topic is a fixed set of
//! partitions backed by bounded tokio channels:
//!
//! - sends suspend when a partition is full (backpressure);
//! - keyed messages always land on the same partition, so they are observed
//!   in send order;
//! - a topic has exactly one [`Subscription`], which merges all partitions
//!   and cannot be restarted once cancelled.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt, StreamMap};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::partitioner::{DefaultPartitioner, Partitioner};
use crate::types::{Message, Offset, PartitionId, RecordMetadata};

mod broker;
mod subscription;
mod topic;

pub use broker::*;
pub use subscription::*;
pub use topic::*;

/// Default per-partition buffer size (bounded for backpressure).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
