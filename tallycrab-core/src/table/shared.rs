use super::*;

/// Cloneable handle to a [`TumblingWindowTable`] behind one coarse mutex.
///
/// Every call takes the lock for its whole duration, so a read never observes
/// a half-applied batch from [`with`](Self::with). A poisoned lock is
/// recovered: the table holds plain counters and stays consistent per call.
pub struct SharedTable<K, V = u64> {
    inner: Arc<Mutex<TumblingWindowTable<K, V>>>,
}

impl<K, V> Clone for SharedTable<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedTable<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    V: Clone + AddAssign,
{
    pub fn new(table: TumblingWindowTable<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(table)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TumblingWindowTable<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the table.
    pub fn with<R>(&self, f: impl FnOnce(&mut TumblingWindowTable<K, V>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn add_at(&self, key: K, amount: V, at: EventTime) -> WriteOutcome {
        self.lock().add_at(key, amount, at)
    }

    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().get(key)
    }

    pub fn items(&self) -> Vec<(K, V)> {
        self.lock().items()
    }

    pub fn current<Q>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().current(key)
    }

    pub fn delta<Q>(&self, key: &Q, ago: Duration) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().delta(key, ago)
    }

    pub fn evict(&self, now: EventTime) -> usize {
        self.lock().evict(now)
    }

    pub fn live_windows(&self) -> Vec<WindowRange> {
        self.lock().live_windows()
    }

    pub fn window_count(&self) -> usize {
        self.lock().window_count()
    }

    pub fn stale_writes(&self) -> u64 {
        self.lock().stale_writes()
    }

    pub fn name(&self) -> String {
        self.lock().name().to_string()
    }
}

impl<K> SharedTable<K, u64>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    pub fn increment_at(&self, key: K, at: EventTime) -> WriteOutcome {
        self.lock().increment_at(key, at)
    }
}

impl<K, V> std::fmt::Debug for SharedTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedTable(<locked>)")
    }
}
