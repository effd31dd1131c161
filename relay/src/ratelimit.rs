//! Fixed-window rate limiting keyed by (client, route policy).
//!
//! Each rate-limited route registers one policy; exactly that policy governs
//! the route (most-specific-only, no stacking with the default). Counters
//! live in an in-memory map guarded by a mutex, so limits are per-process.
//!
//! Once a window is over its limit the counter saturates at
//! `max_requests + 1` rather than growing with every rejected request.
//! Expired windows are swept out of the map at most once per sweep interval,
//! so clients that stop sending do not stay resident forever.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Identifies which route-level policy governs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyId {
    /// Fallback for routes without a registered policy.
    Default,
    /// GET /api/v1/status
    Status,
    /// GET|POST /api/v1/data
    Data,
    /// POST /telegram/send
    TelegramSend,
}

/// A request quota: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl fmt::Display for RatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} per {} seconds",
            self.max_requests,
            self.window.as_secs()
        )
    }
}

/// Per-window counter state.
struct Window {
    count: u32,
    started: Instant,
}

/// Counter map plus the time of the last expired-window sweep.
struct WindowState {
    map: HashMap<(String, PolicyId), Window>,
    last_sweep: Instant,
}

/// How often expired windows are swept out of the map.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// In-memory fixed-window rate limiter.
///
/// Thread-safe; axum handlers run concurrently and may hit the same
/// (client, policy) counter at once. The mutex is never held across I/O.
pub struct RateLimiter {
    policies: HashMap<PolicyId, RatePolicy>,
    sweep_interval: Duration,
    windows: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter with the given default policy.
    pub fn new(default: RatePolicy) -> Self {
        let mut policies = HashMap::new();
        policies.insert(PolicyId::Default, default);
        Self {
            policies,
            sweep_interval: SWEEP_INTERVAL,
            windows: Mutex::new(WindowState {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Register a route-specific policy. Later registrations replace
    /// earlier ones for the same id.
    pub fn register(mut self, id: PolicyId, policy: RatePolicy) -> Self {
        self.policies.insert(id, policy);
        self
    }

    /// Override how often expired windows are swept.
    pub fn sweep_every(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// The policy governing `id`: its own registration, or the default.
    pub fn policy_for(&self, id: PolicyId) -> RatePolicy {
        self.policies
            .get(&id)
            .or_else(|| self.policies.get(&PolicyId::Default))
            .copied()
            .expect("default policy always registered")
    }

    /// Record a request from `client_key` against policy `id`.
    ///
    /// Returns `Err` with the violated policy when the request exceeds the
    /// quota for the current window.
    pub fn check(&self, client_key: &str, id: PolicyId) -> Result<(), RatePolicy> {
        let policy = self.policy_for(id);
        let now = Instant::now();

        let mut state = self
            .windows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if now.duration_since(state.last_sweep) >= self.sweep_interval {
            self.sweep(&mut state, now);
        }

        let window = state
            .map
            .entry((client_key.to_string(), id))
            .or_insert(Window {
                count: 0,
                started: now,
            });

        if now.duration_since(window.started) >= policy.window {
            window.count = 0;
            window.started = now;
        }

        // Saturate rather than count every rejected request
        if window.count <= policy.max_requests {
            window.count += 1;
        }

        if window.count > policy.max_requests {
            warn!(
                client = %client_key,
                policy = ?id,
                limit = policy.max_requests,
                window_secs = policy.window.as_secs(),
                "rate_limit_exceeded"
            );
            return Err(policy);
        }

        Ok(())
    }

    /// Boolean form of [`check`](Self::check).
    pub fn allow(&self, client_key: &str, id: PolicyId) -> bool {
        self.check(client_key, id).is_ok()
    }

    /// Remove windows whose period has fully elapsed. Keys are
    /// client-supplied, so stale entries must not accumulate.
    fn sweep(&self, state: &mut WindowState, now: Instant) {
        let before = state.map.len();
        state.map.retain(|(_, id), window| {
            now.duration_since(window.started) < self.policy_for(*id).window
        });
        state.last_sweep = now;

        let evicted = before - state.map.len();
        if evicted > 0 {
            debug!(
                evicted = evicted,
                remaining = state.map.len(),
                "rate_limit_windows_evicted"
            );
        }
    }
}
