//! Generic service descriptors.
//!
//! A [`ServiceDescriptor`] is what the embedding application registers: a
//! factory for its [`ServiceControl`] plus optional lifecycle hooks. The
//! builder turns it into the [`ServiceHandle`] the bridge drives.

use async_trait::async_trait;

use crate::control::HostControl;
use crate::error::Result;
use crate::service::{ServiceControl, ServiceHandle};
use crate::settings::HostSettings;

type Factory = Box<dyn FnOnce(&HostSettings) -> Result<Box<dyn ServiceControl>> + Send>;
type Hook = Box<dyn Fn(&HostSettings) + Send + Sync>;

#[derive(Default)]
struct ServiceHooks {
    before_starting: Vec<Hook>,
    after_starting: Vec<Hook>,
    before_stopping: Vec<Hook>,
    after_stopping: Vec<Hook>,
}

impl ServiceHooks {
    fn fire(hooks: &[Hook], settings: &HostSettings) {
        for hook in hooks {
            hook(settings);
        }
    }
}

/// Factory and hooks for one hosted service.
pub struct ServiceDescriptor {
    factory: Factory,
    hooks: ServiceHooks,
}

impl ServiceDescriptor {
    /// Creates a descriptor from a service factory.
    ///
    /// The factory runs once, at build time, with the final settings.
    pub fn new<S, F>(factory: F) -> Self
    where
        S: ServiceControl,
        F: FnOnce(&HostSettings) -> Result<S> + Send + 'static,
    {
        Self {
            factory: Box::new(move |settings| {
                factory(settings).map(|service| Box::new(service) as Box<dyn ServiceControl>)
            }),
            hooks: ServiceHooks::default(),
        }
    }

    /// Runs `hook` right before the service is started.
    pub fn before_starting<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HostSettings) + Send + Sync + 'static,
    {
        self.hooks.before_starting.push(Box::new(hook));
        self
    }

    /// Runs `hook` after the service reported a successful start.
    pub fn after_starting<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HostSettings) + Send + Sync + 'static,
    {
        self.hooks.after_starting.push(Box::new(hook));
        self
    }

    /// Runs `hook` right before the service is stopped.
    pub fn before_stopping<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HostSettings) + Send + Sync + 'static,
    {
        self.hooks.before_stopping.push(Box::new(hook));
        self
    }

    /// Runs `hook` after the service reported a successful stop.
    pub fn after_stopping<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&HostSettings) + Send + Sync + 'static,
    {
        self.hooks.after_stopping.push(Box::new(hook));
        self
    }

    /// Constructs the service and wraps it into a handle.
    ///
    /// # Errors
    /// Propagates the factory's error.
    pub fn build(self, settings: &HostSettings) -> Result<Box<dyn ServiceHandle>> {
        let service = (self.factory)(settings)?;
        Ok(Box::new(ControlServiceHandle {
            service: Some(service),
            hooks: self.hooks,
            settings: settings.clone(),
        }))
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("before_starting", &self.hooks.before_starting.len())
            .field("after_starting", &self.hooks.after_starting.len())
            .field("before_stopping", &self.hooks.before_stopping.len())
            .field("after_stopping", &self.hooks.after_stopping.len())
            .finish_non_exhaustive()
    }
}

/// Handle built from a descriptor.
struct ControlServiceHandle {
    service: Option<Box<dyn ServiceControl>>,
    hooks: ServiceHooks,
    settings: HostSettings,
}

#[async_trait]
impl ServiceHandle for ControlServiceHandle {
    async fn start(&mut self, control: &HostControl) -> Result<bool> {
        let Some(service) = self.service.as_mut() else {
            return Ok(false);
        };
        ServiceHooks::fire(&self.hooks.before_starting, &self.settings);
        let started = service.start(control).await;
        if started {
            ServiceHooks::fire(&self.hooks.after_starting, &self.settings);
        }
        Ok(started)
    }

    async fn stop(&mut self, control: &HostControl) -> Result<bool> {
        let Some(service) = self.service.as_mut() else {
            return Ok(false);
        };
        ServiceHooks::fire(&self.hooks.before_stopping, &self.settings);
        let stopped = service.stop(control).await;
        if stopped {
            ServiceHooks::fire(&self.hooks.after_stopping, &self.settings);
        }
        Ok(stopped)
    }

    async fn release(&mut self) {
        if self.service.take().is_some() {
            tracing::debug!(service = %self.settings.service_name, "service released");
        }
    }
}
