use super::*;

/// Lifecycle of the process. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// Broker, topic and table are being established.
    Starting,
    /// Producer and consumer tasks are live.
    Running,
    /// The producer has been told to stop; the consumer is draining.
    Draining,
    /// Terminal.
    Stopped,
}

impl AppState {
    pub fn is_terminal(self) -> bool {
        self == AppState::Stopped
    }
}

impl std::fmt::Display for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AppState::Starting => "starting",
            AppState::Running => "running",
            AppState::Draining => "draining",
            AppState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Publishes [`AppState`] changes and refuses to move backwards.
#[derive(Debug, Clone)]
pub(crate) struct StateCell {
    tx: Arc<watch::Sender<AppState>>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(AppState::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn get(&self) -> AppState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Move to `next` if it is ahead of the current state.
    pub(crate) fn advance(&self, next: AppState) -> bool {
        let moved = self.tx.send_if_modified(|state| {
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        });
        if moved {
            info!(state = %next, "app state changed");
        }
        moved
    }
}
