use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// A point-in-time view of the backend's rate-limit quota, as reported
/// by response headers.
///
/// Both fields are optional because the backend is free to omit either
/// header. An empty snapshot carries no information and merging it is a
/// no-op.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// Number of requests left in the current window
    pub remaining: Option<u64>,

    /// When the current window ends and the quota replenishes
    pub reset: Option<SystemTime>,
}

impl QuotaSnapshot {
    /// Whether this snapshot carries any information at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remaining.is_none() && self.reset.is_none()
    }
}

/// Rate-limit state shared by all requests going through one transport.
///
/// Responses complete in arbitrary order, so a response from an older
/// quota window can arrive after a response from a newer one. Updates are
/// merged monotonically: the reset timestamp never moves backwards and,
/// within the same window, the remaining count only shrinks. Stale
/// updates are discarded.
///
/// The lock is only ever held for the duration of a field copy, never
/// across an await point.
#[derive(Debug, Default)]
pub struct SharedQuota {
    current: Mutex<QuotaSnapshot>,
}

impl SharedQuota {
    /// Merge a header-derived snapshot into the shared state.
    pub fn observe(&self, update: QuotaSnapshot) {
        if update.is_empty() {
            return;
        }

        let mut current = self.current.lock().unwrap();
        match (update.reset, current.reset) {
            // Update belongs to an older window than what we already hold.
            (Some(upd), Some(cur)) if upd < cur => {
                log::debug!("Discarding stale rate-limit update (reset moved backwards)");
            }
            // Update opens a newer window; the old remaining count no
            // longer applies, trust the update wholesale.
            (Some(upd), Some(cur)) if upd > cur => {
                *current = update;
            }
            // We had no reset timestamp yet; take whatever the update has.
            (Some(_), None) => {
                *current = update;
            }
            // Same window (or no window information either way): the
            // quota only ever shrinks as concurrent requests consume it.
            _ => {
                if let Some(remaining) = update.remaining {
                    current.remaining =
                        Some(current.remaining.map_or(remaining, |cur| cur.min(remaining)));
                }
                if current.reset.is_none() {
                    current.reset = update.reset;
                }
            }
        }
    }

    /// How long a request must wait before its round trip may be
    /// attempted, or `None` if quota is available (or unknown).
    ///
    /// A wait is only required when the quota is known to be exhausted
    /// and the reset lies in the future.
    #[must_use]
    pub fn wait_needed(&self, now: SystemTime) -> Option<Duration> {
        let current = self.current.lock().unwrap();
        if current.remaining != Some(0) {
            return None;
        }
        let reset = current.reset?;
        reset.duration_since(now).ok()
    }

    /// Get a copy of the current snapshot
    #[must_use]
    pub fn snapshot(&self) -> QuotaSnapshot {
        *self.current.lock().unwrap()
    }
}
