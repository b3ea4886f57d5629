//! # App
//!
//! Explicit context that wires the pipeline together:
//!
//! ```text
//! ProducerTimer ──► Topic ──► ConsumerLoop ──► SharedTable ──► SnapshotSink
//! ```
//!
//! [`App`] establishes the broker, topic and table (`Starting`);
//! [`App::start`] spawns the producer and consumer tasks (`Running`);
//! [`RunningApp::shutdown`] stops the producer, drains the consumer
//! (`Draining`) and ends in `Stopped`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::channel::{Broker, Topic};
use crate::clock::{Clock, SystemClock};
use crate::consumer::{
    ConsumerLoop, ConsumerReport, CountRow, SnapshotPolicy, SnapshotSink, StdoutSink, Tokenizer,
    WordTokenizer,
};
use crate::error::{Error, Result};
use crate::producer::{ProducerReport, ProducerTimer, RandomWords, TextSource};
use crate::table::{SharedTable, TumblingWindowTable};

mod config;
mod context;
mod state;

pub use config::*;
pub use context::*;
pub use state::*;

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
