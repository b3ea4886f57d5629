//! # TallyCrab Core
//!
//! Building blocks for a small windowed word-count pipeline.
//!
//! - [`channel`] — In-process pub/sub: [`Broker`](channel::Broker),
//!   partitioned [`Topic`](channel::Topic)s and non-restartable
//!   [`Subscription`](channel::Subscription)s.
//! - [`table`] — [`TumblingWindowTable`](table::TumblingWindowTable): keyed
//!   counters bucketed into fixed, non-overlapping time windows with lazy
//!   eviction, plus the thread-safe [`SharedTable`](table::SharedTable) handle.
//! - [`consumer`] — [`ConsumerLoop`](consumer::ConsumerLoop): decodes, tokenizes
//!   and counts each message, then emits snapshots.
//! - [`producer`] — [`ProducerTimer`](producer::ProducerTimer): periodic text
//!   generation onto a topic.
//! - [`app`] — [`App`](app::App) context and the process lifecycle.

pub mod app;
pub mod channel;
pub mod clock;
pub mod consumer;
pub mod error;
pub mod partitioner;
pub mod producer;
pub mod table;
pub mod types;

pub use error::{Error, Result};
