//! Falsification Tests: Category C - Hosted Lifecycle (F030-F039)
//!
//! # Toyota Way: Jidoka (自働化)
//! Stop immediately when a falsification test fails.

use std::sync::Arc;
use std::time::Duration;

use anfitrion_core::{ExitCode, Fault, HostError, HostMode, HostState};
use anfitrion_test::{
    HostTestHarness, Outcome, RuntimeCall, ScriptedEnvironment, ServiceCall, SpyService,
    StartAction,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn harness(mode: HostMode) -> HostTestHarness {
    HostTestHarness::builder().with_mode(mode).build()
}

/// F030: a console run brackets the running phase with platform notifications
///
/// # Falsification Attempt
/// Run, stop from the platform side, inspect both call logs.
#[tokio::test]
async fn f030_console_run_notifies_platform() {
    let harness = harness(HostMode::Console);
    let (service, probe) = SpyService::new();

    let running = harness.spawn(service).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    let outcome = running.stop(TIMEOUT).await.unwrap();

    assert_eq!(outcome.exit_code, ExitCode::Ok, "F030 FALSIFIED: console stop not clean");
    assert_eq!(
        probe.calls(),
        vec![ServiceCall::Start, ServiceCall::Stop, ServiceCall::Release],
        "F030 FALSIFIED: unexpected service call order"
    );
    assert_eq!(
        harness.runtime().calls(),
        vec![RuntimeCall::Running, RuntimeCall::Stopping],
        "F030 FALSIFIED: platform notifications missing or out of order"
    );
}

/// F031: a service-initiated stop in role mode recycles the instance
#[tokio::test]
async fn f031_role_service_stop_recycles() {
    let harness = harness(HostMode::Role);
    let (service, probe) = SpyService::new();

    let running = harness.spawn(service).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    probe.control().expect("control captured at start").stop();
    let outcome = running.join(TIMEOUT).await.unwrap();

    assert_eq!(
        outcome.exit_code,
        ExitCode::RecycleRequested,
        "F031 FALSIFIED: role stop should end with a recycle"
    );
    assert!(outcome.error.is_none());
    assert_eq!(harness.runtime().recycles(), 1);
}

/// F032: a platform stop in role mode is a plain stop
#[tokio::test]
async fn f032_role_platform_stop_does_not_recycle() {
    let harness = harness(HostMode::Role);
    let (service, _probe) = SpyService::new();

    let running = harness.spawn(service).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    let outcome = running.stop(TIMEOUT).await.unwrap();

    assert_eq!(outcome.exit_code, ExitCode::Ok);
    assert_eq!(harness.runtime().recycles(), 0, "F032 FALSIFIED: platform stop recycled");
}

/// F033: restart is refused outside role mode and the host keeps running
#[tokio::test]
async fn f033_console_restart_refused() {
    let harness = harness(HostMode::Console);
    let (service, probe) = SpyService::new();
    let service = service.on_start(StartAction::Restart);

    let running = harness.spawn(service).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    assert_eq!(probe.restart_results(), vec![false], "F033 FALSIFIED: restart accepted");
    assert_eq!(running.state(), HostState::Running);

    let outcome = running.stop(TIMEOUT).await.unwrap();
    assert_eq!(outcome.exit_code, ExitCode::Ok);
}

/// F034: restart in role mode recycles once, even when asked during start
#[tokio::test]
async fn f034_role_restart_during_start() {
    let harness = harness(HostMode::Role);
    let (service, probe) = SpyService::new();
    let service = service.on_start(StartAction::Restart);

    let outcome = harness.spawn(service).unwrap().join(TIMEOUT).await.unwrap();

    assert_eq!(probe.restart_results(), vec![true]);
    assert_eq!(outcome.exit_code, ExitCode::RecycleRequested);
    assert_eq!(harness.runtime().recycles(), 1, "F034 FALSIFIED: recycle not requested once");
    assert_eq!(probe.count(ServiceCall::Stop), 1);
}

/// F035: a stop requested while starting is honoured once start returns
#[tokio::test]
async fn f035_stop_during_start() {
    let harness = harness(HostMode::Console);
    let (service, probe) = SpyService::new();
    let service = service
        .start_delay(Duration::from_millis(20))
        .on_start(StartAction::Stop);

    let outcome = harness.spawn(service).unwrap().join(TIMEOUT).await.unwrap();

    assert!(outcome.is_clean());
    assert_eq!(
        probe.calls(),
        vec![ServiceCall::Start, ServiceCall::Stop, ServiceCall::Release]
    );
}

/// F036: release runs exactly once on every failure path
#[tokio::test]
async fn f036_release_once_on_failures() {
    let cases = [
        (Outcome::Refuse, Outcome::Accept, ExitCode::StartServiceFailed),
        (Outcome::Fail("bind failed".into()), Outcome::Accept, ExitCode::StartServiceFailed),
        (Outcome::Accept, Outcome::Refuse, ExitCode::StopServiceFailed),
        (Outcome::Accept, Outcome::Fail("flush failed".into()), ExitCode::StopServiceFailed),
    ];

    for (start, stop, expected) in cases {
        let harness = harness(HostMode::Console);
        let (service, probe) = SpyService::new();
        let service = service
            .start_outcome(start)
            .stop_outcome(stop)
            .on_start(StartAction::Stop);

        let outcome = harness.spawn(service).unwrap().join(TIMEOUT).await.unwrap();

        assert_eq!(outcome.exit_code, expected);
        assert_eq!(
            probe.count(ServiceCall::Release),
            1,
            "F036 FALSIFIED: release count wrong for {expected:?}"
        );
        assert_eq!(outcome.final_state, HostState::Stopped);
    }
}

/// F037: a running installed service blocks console and role, not service mode
#[tokio::test]
async fn f037_already_running_by_mode() {
    for (mode, expected_starts) in [
        (HostMode::Console, 0),
        (HostMode::Role, 0),
        (HostMode::Service, 1),
    ] {
        let environment = Arc::new(ScriptedEnvironment::running());
        let harness = HostTestHarness::builder()
            .with_mode(mode)
            .with_environment(environment.clone())
            .build();
        let (service, probe) = SpyService::new();
        let service = service.on_start(StartAction::Stop);

        let outcome = harness.spawn(service).unwrap().join(TIMEOUT).await.unwrap();

        assert_eq!(
            probe.count(ServiceCall::Start),
            expected_starts,
            "F037 FALSIFIED: wrong start count in {mode}"
        );
        if expected_starts == 0 {
            assert_eq!(outcome.exit_code, ExitCode::ServiceAlreadyRunning);
            assert_eq!(environment.queried_names(), vec!["sample", "sample"]);
        } else {
            assert!(environment.queried_names().is_empty());
        }
    }
}

/// F038: grace-period requests made while stopping reach the platform
#[tokio::test]
async fn f038_additional_time_forwarded() {
    let harness = harness(HostMode::Service);
    let (service, _probe) = SpyService::new();
    let service = service
        .on_start(StartAction::Stop)
        .request_time_on_stop(Duration::from_secs(30));

    harness.spawn(service).unwrap().join(TIMEOUT).await.unwrap();

    assert!(
        harness
            .runtime()
            .calls()
            .contains(&RuntimeCall::AdditionalTime(Duration::from_secs(30))),
        "F038 FALSIFIED: extension not forwarded"
    );
}

/// F039: a reported fault ends the run with the fault, after a full stop
#[tokio::test]
async fn f039_reported_fault_resurfaces() {
    let harness = harness(HostMode::Service);
    let (service, probe) = SpyService::new();

    let running = harness.spawn(service).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    running.fault_guard().observe(Fault::new("ledger corrupted"));
    let outcome = running.join(TIMEOUT).await.unwrap();

    assert_eq!(outcome.exit_code, ExitCode::UnhandledServiceException);
    match outcome.error {
        Some(HostError::UnhandledFault(fault)) => assert_eq!(fault.message(), "ledger corrupted"),
        other => panic!("F039 FALSIFIED: expected an unhandled fault, got {other:?}"),
    }
    assert_eq!(probe.count(ServiceCall::Stop), 1);
    assert_eq!(outcome.parked_threads, 0);
    assert_eq!(harness.runtime().recycles(), 1);
}
