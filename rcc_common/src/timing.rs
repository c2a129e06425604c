//! Loop timing statistics and cooperative shutdown signaling.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Default bound on the loop timer sample ring.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 100_000;

/// Current wall-clock time [µs since epoch].
pub fn wall_clock_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─── Loop Timer ─────────────────────────────────────────────────────

struct TimerInner {
    last: Instant,
    dt: f64,
    samples: VecDeque<f64>,
    capacity: usize,
}

/// Tracks per-iteration delta time and computes running statistics.
///
/// `tick()` is called from the loop's worker thread; readers may run
/// concurrently from any thread. The sample ring is bounded — once full, the
/// oldest sample is dropped per tick.
pub struct LoopTimer {
    inner: Mutex<TimerInner>,
}

impl LoopTimer {
    /// Create a timer with the default sample capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SAMPLE_CAPACITY)
    }

    /// Create a timer bounded to `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TimerInner {
                last: Instant::now(),
                dt: 0.0,
                samples: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
            }),
        }
    }

    /// Record a new loop iteration. Call once at the top of each loop.
    pub fn tick(&self) {
        let now = Instant::now();
        let mut inner = lock(&self.inner);
        inner.dt = now.duration_since(inner.last).as_secs_f64();
        inner.last = now;
        if inner.samples.len() == inner.capacity {
            inner.samples.pop_front();
        }
        let dt = inner.dt;
        inner.samples.push_back(dt);
    }

    /// Most recent delta time [s].
    pub fn dt(&self) -> f64 {
        lock(&self.inner).dt
    }

    /// Average delta time since the last reset [s].
    pub fn avg(&self) -> f64 {
        let inner = lock(&self.inner);
        if inner.samples.is_empty() {
            return inner.dt;
        }
        inner.samples.iter().sum::<f64>() / inner.samples.len() as f64
    }

    /// 95th-percentile delta time since the last reset [s].
    ///
    /// Nearest-rank over a snapshot copy; the sort runs outside the lock.
    pub fn p95(&self) -> f64 {
        let mut samples: Vec<f64> = {
            let inner = lock(&self.inner);
            if inner.samples.is_empty() {
                return inner.dt;
            }
            inner.samples.iter().copied().collect()
        };
        samples.sort_by(f64::total_cmp);
        let idx = ((samples.len() as f64 * 0.95) as usize).min(samples.len() - 1);
        samples[idx]
    }

    /// Clear the sample ring. Call after consuming stats.
    pub fn reset(&self) {
        lock(&self.inner).samples.clear();
    }
}

impl Default for LoopTimer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Shutdown Signal ────────────────────────────────────────────────

#[derive(Default)]
struct SignalInner {
    flagged: Mutex<bool>,
    cv: Condvar,
}

/// One-shot shutdown flag shared between workers.
///
/// `wait_timeout` doubles as the workers' cancellable sleep: it returns early
/// the moment the signal fires.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

impl ShutdownSignal {
    /// Create an unsignaled instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal, waking all waiters. Idempotent.
    pub fn signal(&self) {
        *lock(&self.inner.flagged) = true;
        self.inner.cv.notify_all();
    }

    /// Whether the signal has been raised.
    pub fn is_signaled(&self) -> bool {
        *lock(&self.inner.flagged)
    }

    /// Sleep up to `timeout`, returning `true` if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut flagged = lock(&self.inner.flagged);
        while !*flagged {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .cv
                .wait_timeout(flagged, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            flagged = guard;
        }
        true
    }
}
