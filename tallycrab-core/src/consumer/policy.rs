use super::*;

/// How often the consumer emits a table snapshot.
///
/// Parsed from and printed as `every_message`, `never`, `every:<n>` or
/// `interval:<ms>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SnapshotPolicy {
    /// After every processed message.
    #[default]
    EveryMessage,
    /// After every `n`th processed message.
    EveryN(u64),
    /// After a processed message, at most once per interval (milliseconds).
    IntervalMs(u64),
    Never,
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotPolicy::EveryMessage => f.write_str("every_message"),
            SnapshotPolicy::EveryN(n) => write!(f, "every:{n}"),
            SnapshotPolicy::IntervalMs(ms) => write!(f, "interval:{ms}"),
            SnapshotPolicy::Never => f.write_str("never"),
        }
    }
}

impl FromStr for SnapshotPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "every_message" => return Ok(SnapshotPolicy::EveryMessage),
            "never" => return Ok(SnapshotPolicy::Never),
            _ => {}
        }
        let (kind, amount) = s.split_once(':').ok_or_else(|| invalid_policy(s))?;
        let amount: u64 = amount.trim().parse().map_err(|_| invalid_policy(s))?;
        if amount == 0 {
            return Err(Error::configuration(format!(
                "snapshot policy {s:?} needs a positive amount"
            )));
        }
        match kind.trim() {
            "every" => Ok(SnapshotPolicy::EveryN(amount)),
            "interval" => Ok(SnapshotPolicy::IntervalMs(amount)),
            _ => Err(invalid_policy(s)),
        }
    }
}

fn invalid_policy(s: &str) -> Error {
    Error::configuration(format!(
        "invalid snapshot policy {s:?}: expected every_message, never, every:<n> or interval:<ms>"
    ))
}

impl TryFrom<String> for SnapshotPolicy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SnapshotPolicy> for String {
    fn from(policy: SnapshotPolicy) -> Self {
        policy.to_string()
    }
}

/// Decides, message by message, whether a snapshot is due.
#[derive(Debug)]
pub(crate) struct SnapshotGate {
    policy: SnapshotPolicy,
    since_last: u64,
    last_emit: Option<Instant>,
}

impl SnapshotGate {
    pub(crate) fn new(policy: SnapshotPolicy) -> Self {
        Self {
            policy,
            since_last: 0,
            last_emit: None,
        }
    }

    pub(crate) fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    /// Record one processed message and report whether to emit now.
    pub(crate) fn record(&mut self, now: Instant) -> bool {
        self.since_last += 1;
        let due = match self.policy {
            SnapshotPolicy::EveryMessage => true,
            SnapshotPolicy::EveryN(n) => self.since_last >= n,
            SnapshotPolicy::IntervalMs(ms) => match self.last_emit {
                Some(last) => now.duration_since(last) >= Duration::from_millis(ms),
                None => true,
            },
            SnapshotPolicy::Never => false,
        };
        if due {
            self.since_last = 0;
            self.last_emit = Some(now);
        }
        due
    }
}
