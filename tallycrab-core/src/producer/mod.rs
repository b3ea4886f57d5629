//! # Producer
//!
//! A [`ProducerTimer`] fires on a fixed period, asks a [`TextSource`] for a
//! line of text and sends it to a [`Topic`] as a [`TextRecord`].

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::channel::Topic;
use crate::error::{Error, Result};
use crate::types::{RecordMetadata, TextRecord};

mod source;
mod timer;

pub use source::*;
pub use timer::*;

#[cfg(test)]
#[path = "tests/producer_tests.rs"]
mod tests;
