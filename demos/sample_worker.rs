//! Sample Worker
//!
//! A service that logs "Hello, World." every second until it is stopped.
//! The same binary runs as a console process, under systemd/launchd, or as
//! a cloud worker role.
//!
//! # Usage
//!
//! ```bash
//! # Console: Ctrl+C to stop
//! cargo run --example sample_worker
//!
//! # With a configuration file
//! ANFITRION_CONFIG=sample.toml cargo run --example sample_worker
//!
//! # Override settings without a file
//! ANFITRION_TEST_PHRASE="hi there" ANFITRION_INTERVAL_SECS=3 cargo run --example sample_worker
//!
//! # Pretend to be a role instance
//! ANFITRION_ROLE_INSTANCE=sample_IN_0 cargo run --example sample_worker
//! ```

use std::time::Duration;

use anfitrion::prelude::*;
use anyhow::Context as _;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct SampleService {
    test_phrase: String,
    interval: Duration,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SampleService {
    fn new(test_phrase: String, interval: Duration) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            test_phrase,
            interval,
            cancel,
            task: None,
        }
    }
}

async fn boring(interval: Duration, mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            tracing::info!("Goodbye, Cruel World.");
            return;
        }
        tracing::info!("Hello, World.");
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = cancel.changed() => {}
        }
    }
}

#[async_trait]
impl ServiceControl for SampleService {
    async fn start(&mut self, _control: &HostControl) -> bool {
        tracing::info!("Service starting up: {}", self.test_phrase);
        self.task = Some(tokio::spawn(boring(self.interval, self.cancel.subscribe())));
        true
    }

    async fn stop(&mut self, control: &HostControl) -> bool {
        control.request_additional_time(Duration::from_secs(5));
        let _ = self.cancel.send(true);
        match self.task.take() {
            Some(task) => task.await.is_ok(),
            None => true,
        }
    }
}

fn interval(host: &HostConfigurator) -> anyhow::Result<Duration> {
    let Some(raw) = host.setting("interval_secs") else {
        return Ok(Duration::from_secs(1));
    };
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("interval_secs must be a whole number, got {raw:?}"))?;
    anyhow::ensure!(secs > 0, "interval_secs must be greater than 0");
    Ok(Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    anfitrion::run(|host| {
        let test_phrase = host
            .setting("test_phrase")
            .unwrap_or_else(|| "no phrase configured".to_string());
        let interval = interval(host).map_err(|e| HostError::config(format!("{e:#}")))?;

        host.service(move |_settings| Ok(SampleService::new(test_phrase, interval)))
            .before_starting(|_| tracing::info!("Before starting service!!"))
            .after_stopping(|_| tracing::info!("After stopping service!!"));
        Ok(())
    })
    .await
    .into()
}
