use super::*;

/// Receives table snapshots emitted by the consumer.
pub trait SnapshotSink: Send {
    fn emit(&mut self, snapshot: &[CountRow]);
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for Box<S> {
    fn emit(&mut self, snapshot: &[CountRow]) {
        (**self).emit(snapshot)
    }
}

/// Prints each snapshot as a list of pairs on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl SnapshotSink for StdoutSink {
    fn emit(&mut self, snapshot: &[CountRow]) {
        println!("{snapshot:?}");
    }
}

/// Logs each snapshot at `info` level.
#[derive(Debug, Clone)]
pub struct LogSink {
    table: String,
}

impl LogSink {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl SnapshotSink for LogSink {
    fn emit(&mut self, snapshot: &[CountRow]) {
        info!(table = %self.table, words = snapshot.len(), counts = ?snapshot, "table snapshot");
    }
}

/// Keeps every snapshot in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    snapshots: Arc<Mutex<Vec<Vec<CountRow>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<CountRow>> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Vec<CountRow>> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotSink for MemorySink {
    fn emit(&mut self, snapshot: &[CountRow]) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.to_vec());
    }
}
