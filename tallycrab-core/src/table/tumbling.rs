use super::*;

/// Callback invoked with the final contents of every evicted window.
pub type WindowCloseFn<K, V> = Box<dyn FnMut(WindowRange, IndexMap<K, V>) + Send>;

/// Result of a write against a [`TumblingWindowTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The amount was added to the given window.
    Applied { window: WindowRange },
    /// The write was too late; carries the [`Error::StaleWriteIgnored`] that was logged.
    Dropped(Error),
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

/// Keyed aggregation table partitioned into tumbling event-time windows.
///
/// # Semantics
///
/// - **Writes** land in window `floor(at / size)`, created lazily. A write
///   whose window is below the oldest live window, or is already expired, is
///   dropped and logged instead of being merged backwards.
/// - **Reads** ([`get`](Self::get), [`items`](Self::items)) aggregate over
///   every live window, so a key keeps counting until the windows that hold it
///   age out.
/// - **Eviction** removes windows with `now - size * (index + 1) > expires`.
///   It runs before every write and read; callers never need to invoke
///   [`evict`](Self::evict) themselves.
///
/// "Now" is the high-water mark of the clock and all observed write
/// timestamps, so eviction never moves backwards.
pub struct TumblingWindowTable<K, V = u64> {
    name: String,
    windows: TumblingWindows,
    clock: Arc<dyn Clock>,
    default_factory: Box<dyn Fn() -> V + Send + Sync>,
    /// Live windows ordered by index; each keeps key insertion order.
    live: BTreeMap<WindowIndex, IndexMap<K, V>>,
    high_water: EventTime,
    on_window_close: Option<WindowCloseFn<K, V>>,
    stale_writes: u64,
    evicted_windows: u64,
}

impl<K, V> TumblingWindowTable<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    V: Clone + AddAssign,
{
    /// Create a table whose unseen keys read as `V::default()`.
    pub fn new(
        name: impl Into<String>,
        size: Duration,
        expires: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self>
    where
        V: Default + 'static,
    {
        Self::with_default(name, size, expires, clock, V::default)
    }

    /// Create a table with an explicit zero value for unseen keys.
    pub fn with_default(
        name: impl Into<String>,
        size: Duration,
        expires: Duration,
        clock: Arc<dyn Clock>,
        default_factory: impl Fn() -> V + Send + Sync + 'static,
    ) -> Result<Self> {
        let windows = TumblingWindows::new(size, expires)?;
        Ok(Self {
            name: name.into(),
            windows,
            clock,
            default_factory: Box::new(default_factory),
            live: BTreeMap::new(),
            high_water: EventTime::MIN,
            on_window_close: None,
            stale_writes: 0,
            evicted_windows: 0,
        })
    }

    /// Register a callback that receives each window's contents when it is evicted.
    pub fn on_window_close(
        mut self,
        callback: impl FnMut(WindowRange, IndexMap<K, V>) + Send + 'static,
    ) -> Self {
        self.on_window_close = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn windows(&self) -> TumblingWindows {
        self.windows
    }

    /// Number of writes dropped as stale so far.
    pub fn stale_writes(&self) -> u64 {
        self.stale_writes
    }

    /// Number of windows evicted so far.
    pub fn evicted_windows(&self) -> u64 {
        self.evicted_windows
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Add `amount` to `key` in the window covering the clock's current time.
    pub fn add(&mut self, key: K, amount: V) -> WriteOutcome {
        let at = self.clock.now();
        self.add_at(key, amount, at)
    }

    /// Add `amount` to `key` in the window covering `at`.
    pub fn add_at(&mut self, key: K, amount: V, at: EventTime) -> WriteOutcome {
        let now = self.observe(at);
        self.evict_expired(now);

        let index = self.windows.index_of(at);
        let floor = self.write_floor(now);
        if index < floor {
            self.stale_writes += 1;
            let err = Error::StaleWriteIgnored {
                table: self.name.clone(),
                index,
                floor,
            };
            warn!(table = %self.name, key = ?key, at, error = %err, "dropping late write");
            return WriteOutcome::Dropped(err);
        }

        let default_factory = &self.default_factory;
        let window = self.live.entry(index).or_default();
        *window.entry(key).or_insert_with(|| default_factory()) += amount;
        WriteOutcome::Applied {
            window: self.windows.range(index),
        }
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Aggregate of `key` over every live window.
    pub fn get<Q>(&mut self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.refresh();
        let mut values = self.live.values().filter_map(|window| window.get(key));
        match values.next() {
            Some(first) => values.fold(first.clone(), |mut acc, v| {
                acc += v.clone();
                acc
            }),
            None => (self.default_factory)(),
        }
    }

    /// Snapshot of `(key, aggregate)` across live windows.
    ///
    /// Keys appear in first-seen order, walking windows from oldest to newest.
    /// The returned vector is owned and unaffected by later writes.
    pub fn items(&mut self) -> Vec<(K, V)> {
        self.refresh();
        let mut merged: IndexMap<K, V> = IndexMap::new();
        for window in self.live.values() {
            for (key, value) in window {
                match merged.get_mut(key) {
                    Some(acc) => *acc += value.clone(),
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        merged.into_iter().collect()
    }

    /// Keys present in any live window, in first-seen order.
    pub fn keys(&mut self) -> Vec<K> {
        self.items().into_iter().map(|(k, _)| k).collect()
    }

    /// Value of `key` in the window covering "now" only.
    pub fn current<Q>(&mut self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.refresh();
        self.value_in_window(key, self.windows.index_of(now))
    }

    /// Value of `key` in the window covering `now - ago`.
    pub fn delta<Q>(&mut self, key: &Q, ago: Duration) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.refresh();
        let at = now.saturating_sub(duration_millis(ago));
        self.value_in_window(key, self.windows.index_of(at))
    }

    /// Value of `key` in one specific window, without running eviction.
    pub fn value_in_window<Q>(&self, key: &Q, index: WindowIndex) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live
            .get(&index)
            .and_then(|window| window.get(key))
            .cloned()
            .unwrap_or_else(|| (self.default_factory)())
    }

    /// Ranges of the live windows, oldest first.
    pub fn live_windows(&mut self) -> Vec<WindowRange> {
        self.refresh();
        self.live.keys().map(|&i| self.windows.range(i)).collect()
    }

    pub fn window_count(&mut self) -> usize {
        self.refresh();
        self.live.len()
    }

    // ── Eviction ──────────────────────────────────────────────────────────────

    /// Remove every window that has expired at `now`; returns how many were removed.
    ///
    /// Calling it again without intervening writes is a no-op.
    pub fn evict(&mut self, now: EventTime) -> usize {
        let now = self.observe(now);
        self.evict_expired(now)
    }

    /// Advance "now" to the clock (or `at`, if later) and return it.
    fn observe(&mut self, at: EventTime) -> EventTime {
        self.high_water = self.high_water.max(self.clock.now()).max(at);
        self.high_water
    }

    fn refresh(&mut self) -> EventTime {
        let now = self.observe(EventTime::MIN);
        self.evict_expired(now);
        now
    }

    fn evict_expired(&mut self, now: EventTime) -> usize {
        let mut evicted = 0;
        // Expiry is monotonic in the index, so expired windows form a prefix.
        while let Some(entry) = self.live.first_entry() {
            if !self.windows.is_expired(*entry.key(), now) {
                break;
            }
            let (index, contents) = entry.remove_entry();
            let range = self.windows.range(index);
            debug!(table = %self.name, window = %range, keys = contents.len(), now, "evicting window");
            if let Some(callback) = self.on_window_close.as_mut() {
                callback(range, contents);
            }
            evicted += 1;
        }
        self.evicted_windows += evicted as u64;
        evicted
    }

    /// Lowest window index that may still receive writes at `now`.
    fn write_floor(&self, now: EventTime) -> WindowIndex {
        let min_live = self.windows.min_live_index(now);
        match self.live.keys().next() {
            Some(&oldest) => oldest.max(min_live),
            None => min_live,
        }
    }
}

impl<K> TumblingWindowTable<K, u64>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    /// Count one occurrence of `key` now.
    pub fn increment(&mut self, key: K) -> WriteOutcome {
        self.add(key, 1)
    }

    /// Count one occurrence of `key` at `at`.
    pub fn increment_at(&mut self, key: K, at: EventTime) -> WriteOutcome {
        self.add_at(key, 1, at)
    }
}

impl<K, V> std::fmt::Debug for TumblingWindowTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TumblingWindowTable")
            .field("name", &self.name)
            .field("windows", &self.windows)
            .field("live", &self.live.len())
            .field("high_water", &self.high_water)
            .finish()
    }
}
