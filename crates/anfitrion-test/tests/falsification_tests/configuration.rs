//! Falsification Tests: Category F - Configuration and Wiring (F060-F066)
//!
//! # Toyota Way: Poka-Yoke (ポカヨケ)
//! Misconfiguration fails before the service is constructed.

use std::sync::Arc;
use std::time::Duration;

use anfitrion_core::{
    ExitCode, HostConfig, HostConfigurator, HostControl, HostError, HostMode, HostSettings,
    HostState, ServiceControl,
};
use anfitrion_test::{HostTestHarness, TestError};
use async_trait::async_trait;
use parking_lot::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);

type Journal = Arc<Mutex<Vec<String>>>;

/// Service that writes every call into a shared journal.
struct JournalService {
    journal: Journal,
    phrase: String,
    stop_on_start: bool,
}

#[async_trait]
impl ServiceControl for JournalService {
    async fn start(&mut self, control: &HostControl) -> bool {
        self.journal.lock().push(format!("start:{}", self.phrase));
        if self.stop_on_start {
            control.stop();
        }
        true
    }

    async fn stop(&mut self, _control: &HostControl) -> bool {
        self.journal.lock().push("stop".into());
        true
    }
}

fn journal_hook(journal: &Journal, label: &'static str) -> impl Fn(&HostSettings) + Send + Sync + 'static {
    let journal = journal.clone();
    move |settings| journal.lock().push(format!("{label}:{}", settings.service_name))
}

/// F060: hooks wrap the service calls in order, with the final settings
#[tokio::test]
async fn f060_hooks_wrap_service_calls() {
    let config = HostConfig::parse(
        r#"
        [settings]
        service_name = "sample"

        [properties]
        falsification_phrase = "hello"
        "#,
    )
    .unwrap();

    let journal: Journal = Arc::default();
    let mut configurator = HostConfigurator::new(config);
    let phrase = configurator
        .setting("falsification_phrase")
        .unwrap_or_default();
    let service_journal = journal.clone();
    configurator
        .service(move |_settings| {
            Ok(JournalService {
                journal: service_journal,
                phrase,
                stop_on_start: true,
            })
        })
        .before_starting(journal_hook(&journal, "before_starting"))
        .after_starting(journal_hook(&journal, "after_starting"))
        .before_stopping(journal_hook(&journal, "before_stopping"))
        .after_stopping(journal_hook(&journal, "after_stopping"));
    let (_config, descriptor) = configurator.into_parts().unwrap();

    let harness = HostTestHarness::new();
    let outcome = harness
        .spawn_descriptor(descriptor)
        .unwrap()
        .join(TIMEOUT)
        .await
        .unwrap();

    assert!(outcome.is_clean());
    assert_eq!(
        *journal.lock(),
        vec![
            "before_starting:sample",
            "start:hello",
            "after_starting:sample",
            "before_stopping:sample",
            "stop",
            "after_stopping:sample",
        ],
        "F060 FALSIFIED: hook order broken"
    );
}

/// F061: a configuration without a service is a configuration error
#[test]
fn f061_missing_service_is_configuration_error() {
    let configurator = HostConfigurator::new(HostConfig::new("sample"));
    let err = configurator.into_parts().unwrap_err();

    assert!(matches!(err, HostError::Config(_)));
    assert_eq!(
        err.exit_code(),
        ExitCode::ConfigurationError,
        "F061 FALSIFIED: missing service did not map to ConfigurationError"
    );
}

/// F062: a failing service factory stops the build
#[tokio::test]
async fn f062_factory_error_stops_build() {
    let mut configurator = HostConfigurator::new(HostConfig::new("sample"));
    configurator.service(|_settings| -> anfitrion_core::Result<JournalService> {
        Err(HostError::config("test_phrase is not set"))
    });
    let (_config, descriptor) = configurator.into_parts().unwrap();

    let err = HostTestHarness::new().spawn_descriptor(descriptor).err();
    match err {
        Some(TestError::Host(HostError::Config(msg))) => assert!(msg.contains("test_phrase")),
        other => panic!("F062 FALSIFIED: expected a configuration error, got {other:?}"),
    }
}

/// F063: a zero park interval is rejected at load time
#[test]
fn f063_zero_park_interval_rejected() {
    let err = HostConfig::parse(
        r#"
        [settings]
        service_name = "sample"

        [faults]
        park_interval = "0s"
        "#,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), ExitCode::ConfigurationError);
}

/// F064: a mode override in the file is honoured verbatim
#[test]
fn f064_mode_override_parsed() {
    let config = HostConfig::parse(
        r#"
        mode = "role"

        [settings]
        service_name = "sample"
        instance_name = "blue"
        "#,
    )
    .unwrap();

    assert_eq!(config.mode, Some(HostMode::Role));
    assert_eq!(config.settings.full_name(), "sample@blue");
}

/// F065: an empty service name never reaches the bridge
#[test]
fn f065_empty_service_name_rejected() {
    let mut configurator = HostConfigurator::new(HostConfig::new("sample"));
    configurator.service(|_settings| {
        Ok(JournalService {
            journal: Arc::default(),
            phrase: String::new(),
            stop_on_start: false,
        })
    });
    configurator.settings_mut().service_name = String::new();

    let err = configurator.into_parts().unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::ConfigurationError);
}

/// F066: a descriptor-built host stops from the platform side
#[tokio::test]
async fn f066_descriptor_host_platform_stop() {
    let journal: Journal = Arc::default();
    let mut configurator = HostConfigurator::new(HostConfig::new("sample"));
    let service_journal = journal.clone();
    configurator.service(move |_settings| {
        Ok(JournalService {
            journal: service_journal,
            phrase: "idle".into(),
            stop_on_start: false,
        })
    });
    let (_config, descriptor) = configurator.into_parts().unwrap();

    let running = HostTestHarness::new().spawn_descriptor(descriptor).unwrap();
    running.wait_for_state(HostState::Running, TIMEOUT).await.unwrap();
    let outcome = running.stop(TIMEOUT).await.unwrap();

    assert!(outcome.is_clean());
    assert_eq!(*journal.lock(), vec!["start:idle", "stop"]);
}
