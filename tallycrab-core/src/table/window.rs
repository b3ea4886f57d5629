use super::*;

/// Tumbling window number: `floor(timestamp / size)`.
pub type WindowIndex = i64;

/// A half-open event-time window `[start, end)` and its tumbling index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowRange {
    pub index: WindowIndex,
    pub start: EventTime,
    pub end: EventTime,
}

impl WindowRange {
    /// The maximum timestamp that belongs to this window.
    pub fn max_timestamp(&self) -> EventTime {
        self.end - 1
    }

    /// Return true if `timestamp` falls inside this window.
    pub fn contains(&self, timestamp: EventTime) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

impl std::fmt::Display for WindowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window#{}([{}, {}))", self.index, self.start, self.end)
    }
}

/// Fixed-size, non-overlapping windows aligned to multiples of `size`, kept
/// readable for `expires` after they end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TumblingWindows {
    size_ms: i64,
    expires_ms: i64,
}

impl TumblingWindows {
    /// Windows of `size`, expiring `expires` after their end.
    ///
    /// A zero `size` is rejected.
    pub fn new(size: Duration, expires: Duration) -> Result<Self> {
        let size_ms = duration_millis(size);
        if size_ms <= 0 {
            return Err(Error::configuration(format!(
                "window size must be at least 1ms, got {size:?}"
            )));
        }
        Ok(Self {
            size_ms,
            expires_ms: duration_millis(expires),
        })
    }

    pub fn size_ms(&self) -> i64 {
        self.size_ms
    }

    pub fn expires_ms(&self) -> i64 {
        self.expires_ms
    }

    /// Floor division, so negative timestamps land in negative windows.
    pub fn index_of(&self, timestamp: EventTime) -> WindowIndex {
        timestamp.div_euclid(self.size_ms)
    }

    pub fn range(&self, index: WindowIndex) -> WindowRange {
        let start = index.saturating_mul(self.size_ms);
        WindowRange {
            index,
            start,
            end: start.saturating_add(self.size_ms),
        }
    }

    /// The window `timestamp` belongs to.
    pub fn assign(&self, timestamp: EventTime) -> WindowRange {
        self.range(self.index_of(timestamp))
    }

    /// `now - size * (index + 1) > expires`.
    pub fn is_expired(&self, index: WindowIndex, now: EventTime) -> bool {
        let end = self.range(index).end;
        now.saturating_sub(end) > self.expires_ms
    }

    /// Smallest index that is still live at `now`.
    pub fn min_live_index(&self, now: EventTime) -> WindowIndex {
        // size * (i + 1) >= now - expires  <=>  i >= ceil((now - expires) / size) - 1
        let horizon = now.saturating_sub(self.expires_ms);
        -horizon.saturating_neg().div_euclid(self.size_ms) - 1
    }

    /// Upper bound on simultaneously live windows.
    ///
    /// Equals `ceil(expires / size) + 1`, plus one when `expires` is an exact
    /// multiple of `size`: at that boundary the oldest window has aged exactly
    /// `expires` and is not yet expired while the next one has just opened.
    pub fn max_live_windows(&self) -> usize {
        (self.expires_ms / self.size_ms) as usize + 2
    }
}
