//! Unhandled-fault guard.
//!
//! # Toyota Way: Jidoka (自働化)
//! A fault nobody handled stops the line: it is logged as fatal, recorded
//! for `run()` to re-surface, and the platform is asked to recycle. The
//! faulting thread is parked so it can do no further damage.
//!
//! The guard never takes a lock the lifecycle path holds across an await:
//! state is atomic, latches are watch channels, and the fault slot is only
//! locked for a copy.

use std::cell::Cell;
use std::io::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;

use crate::control::Shared;
use crate::types::{ExecutionContext, Fault, HostState};

type FlushFn = Box<dyn Fn() + Send + Sync>;

/// Process-wide observer of unhandled faults.
pub struct FaultGuard {
    shared: Arc<Shared>,
    parked: AtomicU64,
    last_fault: Mutex<Option<Fault>>,
    flush: FlushFn,
    park_interval: Duration,
}

impl FaultGuard {
    pub(crate) fn new(shared: Arc<Shared>, park_interval: Duration) -> Self {
        Self {
            shared,
            parked: AtomicU64::new(0),
            last_fault: Mutex::new(None),
            flush: Box::new(flush_std_streams),
            park_interval,
        }
    }

    /// Replaces the sink flush performed before a fault is recorded.
    #[must_use]
    pub fn with_flush<F>(mut self, flush: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.flush = Box::new(flush);
        self
    }

    /// Logs, flushes, records and requests a recycle. Never blocks.
    pub fn observe(&self, fault: Fault) {
        tracing::error!(
            id = %self.shared.id,
            fatal = true,
            thread = fault.thread().unwrap_or("<unnamed>"),
            context = ?fault.context(),
            location = fault.location().unwrap_or("<unknown>"),
            "unhandled fault: {}",
            fault.message()
        );
        (self.flush)();

        *self.last_fault.lock() = Some(fault);

        if self.shared.transition(HostState::Running, HostState::Faulted) {
            tracing::warn!(id = %self.shared.id, "service marked faulted");
        }
        self.shared.request_recycle("unhandled fault");
    }

    /// Observes the fault, then parks the calling thread forever unless it
    /// runs a task or is the main thread.
    ///
    /// Does nothing on a thread marked with [`exempt_current_thread`].
    pub fn contain(&self, fault: Fault) {
        if is_current_thread_exempt() {
            tracing::debug!(id = %self.shared.id, "panic on exempt thread left to its joiner");
            return;
        }
        let parks = should_park(&fault);
        self.observe(fault);
        if parks {
            self.park_forever();
        }
    }

    fn park_forever(&self) -> ! {
        let n = self.parked.fetch_add(1, Ordering::SeqCst) + 1;
        rename_current_thread(&format!("unhandled-{n}"));
        tracing::warn!(
            id = %self.shared.id,
            parked = n,
            "faulting thread parked"
        );
        loop {
            std::thread::park_timeout(self.park_interval);
        }
    }

    /// Takes the recorded fault, if any.
    pub fn take_fault(&self) -> Option<Fault> {
        self.last_fault.lock().take()
    }

    /// Returns true if a fault has been recorded and not yet taken.
    #[must_use]
    pub fn has_fault(&self) -> bool {
        self.last_fault.lock().is_some()
    }

    /// Number of threads parked so far. Only ever grows.
    #[must_use]
    pub fn parked_threads(&self) -> u64 {
        self.parked.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for FaultGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultGuard")
            .field("id", &self.shared.id)
            .field("parked", &self.parked_threads())
            .field("park_interval", &self.park_interval)
            .finish_non_exhaustive()
    }
}

/// Explicit fault channel for code that catches its own errors.
///
/// Reporting records the fault and recycles; the caller keeps running.
#[derive(Debug, Clone)]
pub struct FaultReporter {
    guard: Arc<FaultGuard>,
}

impl FaultReporter {
    pub(crate) fn new(guard: Arc<FaultGuard>) -> Self {
        Self { guard }
    }

    /// Reports a fault the caller could not handle.
    pub fn report(&self, fault: Fault) {
        self.guard.observe(fault);
    }
}

thread_local! {
    static EXEMPT: Cell<bool> = const { Cell::new(false) };
}

/// Marks the calling thread's panics as handled by whoever joins it.
///
/// The panic hook then neither records nor parks them. Call it first thing
/// on worker threads that are joined with [`std::thread::JoinHandle::join`]
/// or run under [`std::panic::catch_unwind`], and report what the joiner
/// cannot handle through [`FaultReporter`].
pub fn exempt_current_thread() {
    EXEMPT.with(|exempt| exempt.set(true));
}

fn is_current_thread_exempt() -> bool {
    EXEMPT.with(Cell::get)
}

/// Routes panics through `guard`.
///
/// Only the first call per process installs the hook; later calls return
/// false. The hook stays installed for the life of the process. Panics in
/// tasks and on the main thread are recorded and then handed to the
/// previous hook so they unwind as usual.
///
/// # Caught panics
///
/// The hook runs before unwinding, so it cannot tell a panic some caller
/// will catch from one nobody handles. A plain thread is parked even if
/// its panic would have reached `catch_unwind` or a `join`, and whoever
/// waits on it waits forever. Threads like that must call
/// [`exempt_current_thread`]; thread pools that catch panics internally
/// should not run alongside the hook at all.
pub fn install_panic_hook(guard: Arc<FaultGuard>) -> bool {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    let mut installed = false;
    INSTALLED.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            guard.contain(Fault::from_panic(info));
            previous(info);
        }));
        installed = true;
    });

    if installed {
        tracing::debug!("panic hook installed");
    }
    installed
}

fn should_park(fault: &Fault) -> bool {
    fault.context() == ExecutionContext::Thread && fault.thread() != Some("main")
}

fn flush_std_streams() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

#[cfg(target_os = "linux")]
fn rename_current_thread(name: &str) {
    // The kernel truncates at 15 bytes.
    let Ok(name) = std::ffi::CString::new(name) else {
        return;
    };
    if let Err(e) = nix::sys::prctl::set_name(&name) {
        tracing::debug!(error = %e, "failed to rename parked thread");
    }
}

#[cfg(not(target_os = "linux"))]
fn rename_current_thread(_name: &str) {}
