//! Test doubles for the collaborators of a host.
//!
//! Every double records what happened to it so tests can assert on the
//! exact sequence the bridge drove.

use std::sync::Arc;
use std::time::Duration;

use anfitrion_core::{
    HostControl, HostEnvironment, HostError, HostMode, PlatformRuntime, ServiceHandle,
};
use async_trait::async_trait;
use parking_lot::Mutex;

/// A call the bridge made on a [`SpyService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCall {
    /// `start`
    Start,
    /// `stop`
    Stop,
    /// `release`
    Release,
}

/// How a spy answers one lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Return `Ok(true)`.
    Accept,
    /// Return `Ok(false)`.
    Refuse,
    /// Return an error with this message.
    Fail(String),
}

impl Outcome {
    fn answer(&self) -> anfitrion_core::Result<bool> {
        match self {
            Self::Accept => Ok(true),
            Self::Refuse => Ok(false),
            Self::Fail(msg) => Err(HostError::Internal(msg.clone())),
        }
    }
}

/// Something the spy does with its [`HostControl`] while starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartAction {
    /// Nothing.
    None,
    /// Call [`HostControl::stop`].
    Stop,
    /// Call [`HostControl::restart`] and record the result.
    Restart,
}

/// Shared view of what a [`SpyService`] observed.
#[derive(Default)]
pub struct SpyProbe {
    calls: Mutex<Vec<ServiceCall>>,
    control: Mutex<Option<HostControl>>,
    restart_results: Mutex<Vec<bool>>,
}

impl SpyProbe {
    /// Calls in the order they arrived.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().clone()
    }

    /// Number of times `call` arrived.
    #[must_use]
    pub fn count(&self, call: ServiceCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// The control the service was started with.
    #[must_use]
    pub fn control(&self) -> Option<HostControl> {
        self.control.lock().clone()
    }

    /// Whether each restart attempt was accepted.
    #[must_use]
    pub fn restart_results(&self) -> Vec<bool> {
        self.restart_results.lock().clone()
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().push(call);
    }
}

/// Scripted [`ServiceHandle`].
///
/// # Example
///
/// ```rust,ignore
/// let (service, probe) = SpyService::new();
/// let service = service.stop_outcome(Outcome::Refuse);
/// ```
pub struct SpyService {
    probe: Arc<SpyProbe>,
    start: Outcome,
    stop: Outcome,
    start_action: StartAction,
    start_delay: Duration,
    stop_grace: Option<Duration>,
}

impl SpyService {
    /// Creates a spy that accepts every call, plus its probe.
    #[must_use]
    pub fn new() -> (Self, Arc<SpyProbe>) {
        let probe = Arc::new(SpyProbe::default());
        let spy = Self {
            probe: probe.clone(),
            start: Outcome::Accept,
            stop: Outcome::Accept,
            start_action: StartAction::None,
            start_delay: Duration::ZERO,
            stop_grace: None,
        };
        (spy, probe)
    }

    /// Sets the start answer.
    #[must_use]
    pub fn start_outcome(mut self, outcome: Outcome) -> Self {
        self.start = outcome;
        self
    }

    /// Sets the stop answer.
    #[must_use]
    pub fn stop_outcome(mut self, outcome: Outcome) -> Self {
        self.stop = outcome;
        self
    }

    /// Runs `action` inside start, before answering.
    #[must_use]
    pub fn on_start(mut self, action: StartAction) -> Self {
        self.start_action = action;
        self
    }

    /// Sleeps inside start.
    #[must_use]
    pub const fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Asks for a longer grace period inside stop.
    #[must_use]
    pub const fn request_time_on_stop(mut self, additional: Duration) -> Self {
        self.stop_grace = Some(additional);
        self
    }
}

#[async_trait]
impl ServiceHandle for SpyService {
    async fn start(&mut self, control: &HostControl) -> anfitrion_core::Result<bool> {
        self.probe.record(ServiceCall::Start);
        *self.probe.control.lock() = Some(control.clone());

        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }

        match self.start_action {
            StartAction::None => {}
            StartAction::Stop => control.stop(),
            StartAction::Restart => {
                let accepted = control.restart().is_ok();
                self.probe.restart_results.lock().push(accepted);
            }
        }
        self.start.answer()
    }

    async fn stop(&mut self, control: &HostControl) -> anfitrion_core::Result<bool> {
        self.probe.record(ServiceCall::Stop);
        if let Some(additional) = self.stop_grace {
            control.request_additional_time(additional);
        }
        self.stop.answer()
    }

    async fn release(&mut self) {
        self.probe.record(ServiceCall::Release);
    }
}

/// Service manager view whose answers can change mid-test.
#[derive(Default)]
pub struct ScriptedEnvironment {
    installed: Mutex<bool>,
    stopped: Mutex<bool>,
    failure: Mutex<Option<String>>,
    queried: Mutex<Vec<String>>,
}

impl ScriptedEnvironment {
    /// Nothing installed.
    #[must_use]
    pub fn detached() -> Self {
        let environment = Self::default();
        environment.set_stopped(true);
        environment
    }

    /// Installed and running.
    #[must_use]
    pub fn running() -> Self {
        let environment = Self::default();
        environment.set_installed(true);
        environment
    }

    /// Sets whether the service is installed.
    pub fn set_installed(&self, installed: bool) {
        *self.installed.lock() = installed;
    }

    /// Sets whether the service is stopped.
    pub fn set_stopped(&self, stopped: bool) {
        *self.stopped.lock() = stopped;
    }

    /// Makes every later query fail.
    pub fn fail_with(&self, msg: impl Into<String>) {
        *self.failure.lock() = Some(msg.into());
    }

    /// Names queried so far.
    #[must_use]
    pub fn queried_names(&self) -> Vec<String> {
        self.queried.lock().clone()
    }

    fn answer(&self, name: &str, value: bool) -> anfitrion_core::Result<bool> {
        self.queried.lock().push(name.to_string());
        match self.failure.lock().as_ref() {
            Some(msg) => Err(HostError::environment(msg.clone())),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl HostEnvironment for ScriptedEnvironment {
    async fn is_service_installed(&self, name: &str) -> anfitrion_core::Result<bool> {
        let installed = *self.installed.lock();
        self.answer(name, installed)
    }

    async fn is_service_stopped(&self, name: &str) -> anfitrion_core::Result<bool> {
        let stopped = *self.stopped.lock();
        self.answer(name, stopped)
    }
}

/// A primitive the bridge asked the platform for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeCall {
    /// `request_additional_time`
    AdditionalTime(Duration),
    /// `request_recycle`
    Recycle,
    /// `notify_running`
    Running,
    /// `notify_stopping`
    Stopping,
}

/// Platform runtime that records every call in order.
pub struct RecordingRuntime {
    mode: HostMode,
    calls: Mutex<Vec<RuntimeCall>>,
}

impl RecordingRuntime {
    /// Creates a runtime serving `mode`.
    #[must_use]
    pub fn new(mode: HostMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls in the order they arrived.
    #[must_use]
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().clone()
    }

    /// Number of recycle requests.
    #[must_use]
    pub fn recycles(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| **c == RuntimeCall::Recycle)
            .count()
    }

    fn record(&self, call: RuntimeCall) -> anfitrion_core::Result<()> {
        self.calls.lock().push(call);
        Ok(())
    }
}

impl PlatformRuntime for RecordingRuntime {
    fn mode(&self) -> HostMode {
        self.mode
    }

    fn request_additional_time(&self, additional: Duration) -> anfitrion_core::Result<()> {
        self.record(RuntimeCall::AdditionalTime(additional))
    }

    fn request_recycle(&self) -> anfitrion_core::Result<()> {
        self.record(RuntimeCall::Recycle)
    }

    fn notify_running(&self) -> anfitrion_core::Result<()> {
        self.record(RuntimeCall::Running)
    }

    fn notify_stopping(&self) -> anfitrion_core::Result<()> {
        self.record(RuntimeCall::Stopping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_environment_records_names() {
        let environment = ScriptedEnvironment::detached();
        assert!(!environment.is_service_installed("sample").await.unwrap());
        assert!(environment.is_service_stopped("sample").await.unwrap());
        assert_eq!(environment.queried_names(), vec!["sample", "sample"]);
    }

    #[tokio::test]
    async fn test_scripted_environment_failure() {
        let environment = ScriptedEnvironment::running();
        environment.fail_with("systemctl missing");
        let err = environment.is_service_installed("sample").await.unwrap_err();
        assert!(err.to_string().contains("systemctl missing"));
    }

    #[test]
    fn test_recording_runtime_order() {
        let runtime = RecordingRuntime::new(HostMode::Role);
        runtime.notify_running().unwrap();
        runtime.request_recycle().unwrap();
        runtime.notify_stopping().unwrap();
        assert_eq!(
            runtime.calls(),
            vec![RuntimeCall::Running, RuntimeCall::Recycle, RuntimeCall::Stopping]
        );
        assert_eq!(runtime.recycles(), 1);
    }

    #[test]
    fn test_outcome_answers() {
        assert!(Outcome::Accept.answer().unwrap());
        assert!(!Outcome::Refuse.answer().unwrap());
        assert!(Outcome::Fail("boom".into()).answer().is_err());
    }
}
