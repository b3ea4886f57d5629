//! # Consumer
//!
//! Drives messages from a [`Subscription`](crate::channel::Subscription) into
//! a word-count [`SharedTable`]:
//!
//! 1. decode the payload as a [`TextRecord`];
//! 2. split it into lowercase word tokens with a [`Tokenizer`];
//! 3. count each token in the window of the message's arrival timestamp;
//! 4. hand a snapshot of the table to a [`SnapshotSink`], as often as the
//!    [`SnapshotPolicy`] allows.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::channel::Subscription;
use crate::error::{Error, Result};
use crate::table::SharedTable;
use crate::types::{Message, TextRecord};

mod policy;
mod sink;
mod tokenizer;
mod worker;

pub use policy::*;
pub use sink::*;
pub use tokenizer::*;
pub use worker::*;

/// One `(word, count)` row of a table snapshot.
pub type CountRow = (String, u64);

#[cfg(test)]
#[path = "tests/consumer_tests.rs"]
mod tests;
