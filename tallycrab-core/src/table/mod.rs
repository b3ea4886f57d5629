//! # Windowed tables
//!
//! Keyed aggregation state bucketed into tumbling (fixed-size,
//! non-overlapping) event-time windows.
//!
//! - [`TumblingWindows`] — window arithmetic: index assignment and expiry.
//! - [`TumblingWindowTable`] — the table itself; lazy eviction on every access.
//! - [`SharedTable`] — a cloneable, lock-guarded handle for use across tasks.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::ops::AddAssign;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, duration_millis};
use crate::error::{Error, Result};
use crate::types::EventTime;

mod shared;
mod tumbling;
mod window;

pub use shared::*;
pub use tumbling::*;
pub use window::*;

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
