//! Falsification Tests: Category E - Platform Adapters (F050-F057)
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Drive the real adapters, not doubles of them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anfitrion_core::{
    ExitCode, HostBuilder, HostControl, HostError, HostMode, HostOptions, HostSettings,
    ServiceControl, ServiceDescriptor,
};
use anfitrion_platform::{
    ConsoleRuntime, DetachedEnvironment, PlatformError, ROLE_INSTANCE_ENV, RoleRuntime,
    ServiceManager, detect_mode_with, select_environment, select_runtime,
};
use async_trait::async_trait;

fn options() -> HostOptions {
    HostOptions {
        change_working_dir: false,
        install_panic_hook: false,
        park_interval: Duration::from_millis(50),
    }
}

/// Accepts both calls and asks to stop as soon as it has started.
struct OneShot;

#[async_trait]
impl ServiceControl for OneShot {
    async fn start(&mut self, control: &HostControl) -> bool {
        control.stop();
        true
    }

    async fn stop(&mut self, _control: &HostControl) -> bool {
        true
    }
}

fn one_shot() -> ServiceDescriptor {
    ServiceDescriptor::new(|_settings| Ok(OneShot))
}

/// F050: every selected runtime is accepted by the builder for its mode
#[test]
fn f050_selected_adapters_build() {
    for manager in [ServiceManager::Systemd, ServiceManager::Launchd, ServiceManager::None] {
        for mode in [HostMode::Console, HostMode::Service, HostMode::Role] {
            let built = HostBuilder::new(mode)
                .settings(HostSettings::new("sample"))
                .environment(select_environment(manager, false))
                .runtime(select_runtime(mode, manager))
                .options(options())
                .build(one_shot());
            assert!(
                built.is_ok(),
                "F050 FALSIFIED: {mode} on {manager} rejected: {:?}",
                built.err()
            );
        }
    }
}

/// F051: a runtime serving another mode is rejected
#[test]
fn f051_runtime_mode_mismatch_rejected() {
    let err = HostBuilder::new(HostMode::Role)
        .settings(HostSettings::new("sample"))
        .environment(Arc::new(DetachedEnvironment))
        .runtime(Arc::new(ConsoleRuntime::new()))
        .options(options())
        .build(one_shot())
        .unwrap_err();

    assert!(
        matches!(err, HostError::InvalidArgument(_)),
        "F051 FALSIFIED: mismatch accepted or misreported: {err}"
    );
}

/// F052: detection precedence is role, then service manager, then console
#[test]
fn f052_detection_precedence() {
    let cases: [(&[(&str, &str)], HostMode); 5] = [
        (&[], HostMode::Console),
        (&[("XPC_SERVICE_NAME", "0")], HostMode::Console),
        (&[("XPC_SERVICE_NAME", "com.example.sample")], HostMode::Service),
        (&[("NOTIFY_SOCKET", "/run/systemd/notify")], HostMode::Service),
        (
            &[(ROLE_INSTANCE_ENV, "worker_IN_1"), ("INVOCATION_ID", "6f1c")],
            HostMode::Role,
        ),
    ];

    for (pairs, expected) in cases {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        let detected = detect_mode_with(|key| map.get(key).map(|v| (*v).to_string()));
        assert_eq!(detected, expected, "F052 FALSIFIED: {pairs:?}");
    }
}

/// F053: a console host runs end to end without a service manager
#[tokio::test]
async fn f053_console_without_service_manager() {
    let mut host = HostBuilder::new(HostMode::Console)
        .settings(HostSettings::new("sample"))
        .environment(Arc::new(DetachedEnvironment))
        .runtime(Arc::new(ConsoleRuntime::new()))
        .options(options())
        .build(one_shot())
        .unwrap();

    assert_eq!(host.run().await.unwrap(), ExitCode::Ok);
}

/// F054: the role recycle hook fires once per recycle
#[tokio::test]
async fn f054_role_recycle_hook_fires() {
    let recycles = Arc::new(AtomicU32::new(0));
    let counter = recycles.clone();
    let runtime = RoleRuntime::new()
        .with_instance_id("worker_IN_0")
        .on_recycle(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let mut host = HostBuilder::new(HostMode::Role)
        .settings(HostSettings::new("sample"))
        .environment(Arc::new(DetachedEnvironment))
        .runtime(Arc::new(runtime))
        .options(options())
        .build(one_shot())
        .unwrap();

    assert_eq!(host.run().await.unwrap(), ExitCode::RecycleRequested);
    assert_eq!(
        recycles.load(Ordering::SeqCst),
        1,
        "F054 FALSIFIED: recycle hook not called exactly once"
    );
}

/// F055: a failing recycle hook does not change the outcome
#[tokio::test]
async fn f055_role_recycle_hook_failure_tolerated() {
    let runtime = RoleRuntime::new()
        .on_recycle(|| Err(PlatformError::notify("role agent unreachable").into()));

    let mut host = HostBuilder::new(HostMode::Role)
        .settings(HostSettings::new("sample"))
        .environment(Arc::new(DetachedEnvironment))
        .runtime(Arc::new(runtime))
        .options(options())
        .build(one_shot())
        .unwrap();

    assert_eq!(host.run().await.unwrap(), ExitCode::RecycleRequested);
}

/// F056: systemd readiness is announced around the running phase
#[cfg(unix)]
#[tokio::test]
async fn f056_systemd_notifications_delivered() {
    use anfitrion_platform::{NotifyTarget, SystemdNotifier};
    use std::os::unix::net::UnixDatagram;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notify.sock");
    let receiver = UnixDatagram::bind(&path).unwrap();

    let mut host = HostBuilder::new(HostMode::Service)
        .settings(HostSettings::new("sample"))
        .environment(Arc::new(DetachedEnvironment))
        .runtime(Arc::new(SystemdNotifier::with_target(NotifyTarget::Path(path))))
        .options(options())
        .build(one_shot())
        .unwrap();

    assert_eq!(host.run().await.unwrap(), ExitCode::Ok);

    let mut buf = [0u8; 256];
    let n = receiver.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"READY=1\nSTATUS=running", "F056 FALSIFIED: no READY");
    let n = receiver.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"STOPPING=1\nSTATUS=stopping", "F056 FALSIFIED: no STOPPING");
}

/// F057: platform errors map onto host errors with the right exit codes
#[test]
fn f057_platform_error_exit_codes() {
    let unsupported: HostError = PlatformError::not_supported("launchd on linux").into();
    let query: HostError = PlatformError::query("systemctl missing").into();

    assert!(matches!(unsupported, HostError::Unsupported(_)));
    assert!(matches!(query, HostError::Environment(_)));
    assert_eq!(query.exit_code(), ExitCode::AbnormalExit);
}
